//! Persistence for the signed-in account.
//!
//! The handle is serialized to JSON and kept in the platform [`SecureStore`].
//! Token values are never logged; failures are reported with the storage
//! error message only.

use crate::error::{AuthError, Result};
use crate::types::AccountHandle;
use mellow_bridge::storage::SecureStore;
use std::sync::Arc;
use tracing::debug;

const ACCOUNT_KEY: &str = "mellow.account";

/// Secure storage for the single tracked account.
#[derive(Clone)]
pub struct AccountStore {
    secure_store: Arc<dyn SecureStore>,
}

impl AccountStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        Self { secure_store }
    }

    /// Store the account, replacing any prior one.
    pub async fn store(&self, account: &AccountHandle) -> Result<()> {
        let json = serde_json::to_vec(account)
            .map_err(|e| AuthError::CorruptedAccount(e.to_string()))?;
        self.secure_store.set_secret(ACCOUNT_KEY, &json).await?;
        debug!(email = %account.email, "Stored account handle");
        Ok(())
    }

    /// Load the cached account, if any.
    pub async fn load(&self) -> Result<Option<AccountHandle>> {
        let Some(bytes) = self.secure_store.get_secret(ACCOUNT_KEY).await? else {
            return Ok(None);
        };

        let account = serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::CorruptedAccount(e.to_string()))?;
        Ok(Some(account))
    }

    /// Remove the cached account. Removing an absent account is fine.
    pub async fn clear(&self) -> Result<()> {
        self.secure_store.delete_secret(ACCOUNT_KEY).await?;
        debug!("Cleared account handle");
        Ok(())
    }
}
