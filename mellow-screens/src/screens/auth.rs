//! Sign-in screen state holder.

use mellow_auth::{IdentitySession, SignInPrompt, SignInResolution};
use std::sync::Arc;
use tokio::sync::watch;

/// UI snapshot for the sign-in screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthScreenState {
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub user_email: Option<String>,
    pub error: Option<String>,
}

/// State holder for the sign-in screen.
pub struct AuthScreen {
    session: Arc<IdentitySession>,
    state: watch::Sender<AuthScreenState>,
}

impl AuthScreen {
    pub fn new(session: Arc<IdentitySession>) -> Self {
        let (state, _) = watch::channel(AuthScreenState::default());
        Self { session, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthScreenState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthScreenState {
        self.state.borrow().clone()
    }

    fn update(&self, f: impl FnOnce(&mut AuthScreenState)) {
        self.state.send_modify(f);
    }

    /// Re-read the cached authorization state.
    pub async fn refresh(&self) {
        match self.session.current_account().await {
            Ok(account) => self.update(|s| {
                s.is_authenticated = account.is_some();
                s.user_email = account.map(|a| a.email);
                s.error = None;
            }),
            Err(e) => self.update(|s| s.error = Some(e.to_string())),
        }
    }

    /// Start a sign-in attempt; the caller launches the returned prompt.
    pub async fn begin_sign_in(&self) -> Option<SignInPrompt> {
        self.update(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.session.sign_in_prompt().await {
            Ok(prompt) => Some(prompt),
            Err(e) => {
                self.update(|s| {
                    s.is_loading = false;
                    s.error = Some(format!("Sign in failed: {}", e));
                });
                None
            }
        }
    }

    /// Fold the platform's sign-in result into the session.
    pub async fn complete_sign_in(&self, resolution: SignInResolution) {
        match self.session.complete_sign_in(resolution).await {
            Ok(account) => self.update(|s| {
                s.is_loading = false;
                s.is_authenticated = true;
                s.user_email = Some(account.email);
                s.error = None;
            }),
            Err(e) => self.update(|s| {
                s.is_loading = false;
                s.error = Some(format!("Sign in failed: {}", e));
            }),
        }
    }

    pub async fn sign_out(&self) {
        match self.session.sign_out().await {
            Ok(()) => self.update(|s| {
                s.is_authenticated = false;
                s.user_email = None;
                s.error = None;
            }),
            Err(e) => self.update(|s| s.error = Some(format!("Failed to sign out: {}", e))),
        }
    }

    pub fn clear_error(&self) {
        self.update(|s| s.error = None);
    }
}
