//! The identity session.
//!
//! Exactly one account is tracked at a time; completing a new sign-in
//! replaces the prior account. Reads (`is_signed_in`, `current_account`)
//! hit only the local credential cache, never the network.

use crate::account_store::AccountStore;
use crate::error::{AuthError, Result};
use crate::oauth::{build_authorization_url, PkceVerifier};
use crate::types::{AccountHandle, SignInPrompt, SignInResolution};
use mellow_bridge::storage::SecureStore;
use mellow_runtime::config::OAuthSettings;
use mellow_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Single-account identity session.
pub struct IdentitySession {
    oauth: OAuthSettings,
    accounts: AccountStore,
    events: EventBus,
    /// Verifier of the in-flight sign-in attempt, if any. A new prompt
    /// replaces the previous attempt.
    pending: Mutex<Option<PkceVerifier>>,
}

impl IdentitySession {
    pub fn new(
        oauth: OAuthSettings,
        secure_store: Arc<dyn SecureStore>,
        events: EventBus,
    ) -> Self {
        Self {
            oauth,
            accounts: AccountStore::new(secure_store),
            events,
            pending: Mutex::new(None),
        }
    }

    fn emit(&self, event: AuthEvent) {
        self.events.emit(CoreEvent::Auth(event)).ok();
    }

    /// Build an authorization prompt for the platform to launch.
    ///
    /// Each call starts a fresh attempt; the verifier is retained until the
    /// matching [`complete_sign_in`](Self::complete_sign_in) arrives.
    #[instrument(skip(self))]
    pub async fn sign_in_prompt(&self) -> Result<SignInPrompt> {
        let pkce = PkceVerifier::new();
        let auth_url = build_authorization_url(&self.oauth, &pkce)?;
        let state = pkce.state().to_string();

        *self.pending.lock().await = Some(pkce);
        self.emit(AuthEvent::SigningIn);

        Ok(SignInPrompt { auth_url, state })
    }

    /// Finish the flow with the platform's result, replacing any prior
    /// account.
    ///
    /// # Errors
    ///
    /// - `AuthError::NoPendingSignIn` when no prompt was issued
    /// - `AuthError::StateMismatch` when the echoed state doesn't match
    #[instrument(skip(self, resolution))]
    pub async fn complete_sign_in(&self, resolution: SignInResolution) -> Result<AccountHandle> {
        let mut pending = self.pending.lock().await;
        let Some(pkce) = pending.as_ref() else {
            return Err(AuthError::NoPendingSignIn);
        };

        if pkce.state() != resolution.state {
            warn!("Sign-in state mismatch; discarding result");
            self.emit(AuthEvent::AuthError {
                message: "Authorization state mismatch".to_string(),
                recoverable: true,
            });
            return Err(AuthError::StateMismatch);
        }
        *pending = None;
        drop(pending);

        let expires_at = resolution
            .expires_in_secs
            .map(|secs| chrono::Utc::now().timestamp() + secs);

        let account = AccountHandle {
            email: resolution.email,
            display_name: resolution.display_name,
            access_token: resolution.access_token,
            expires_at,
        };

        self.accounts.store(&account).await?;
        info!(email = %account.email, "Account signed in");
        self.emit(AuthEvent::SignedIn {
            email: account.email.clone(),
        });

        Ok(account)
    }

    /// Whether an account is cached locally. No network call.
    pub async fn is_signed_in(&self) -> Result<bool> {
        Ok(self.accounts.load().await?.is_some())
    }

    /// The cached account, if any. No network call.
    pub async fn current_account(&self) -> Result<Option<AccountHandle>> {
        self.accounts.load().await
    }

    /// Revoke the local session.
    ///
    /// Signing out without a cached account succeeds silently.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        let account = self.accounts.load().await?;
        self.accounts.clear().await?;
        *self.pending.lock().await = None;

        if let Some(account) = account {
            info!(email = %account.email, "Account signed out");
            self.emit(AuthEvent::SignedOut {
                email: account.email,
            });
        }

        Ok(())
    }
}
