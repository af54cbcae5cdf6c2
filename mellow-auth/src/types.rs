//! Identity types shared across the auth boundary.

use serde::{Deserialize, Serialize};

/// Buffer before token expiry at which a handle counts as expired.
///
/// Treating a token that is about to lapse as already expired keeps callers
/// from starting long downloads with seconds of validity left.
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 300;

/// An authenticated account: email plus token material.
///
/// Opaque to consumers; the catalog provider forwards the access token as a
/// bearer credential and never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountHandle {
    /// Email address of the signed-in account
    pub email: String,
    /// Display name, when the provider reports one
    pub display_name: Option<String>,
    /// OAuth access token
    pub access_token: String,
    /// Token expiry, Unix seconds; `None` when the provider didn't say
    pub expires_at: Option<i64>,
}

impl AccountHandle {
    /// Whether the token is expired (or about to be, within the buffer).
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                chrono::Utc::now().timestamp() + TOKEN_EXPIRY_BUFFER_SECS >= expires_at
            }
            None => false,
        }
    }
}

/// An opaque authorization request for the platform to launch.
///
/// The host opens `auth_url` in a browser or auth tab; `state` comes back
/// in the redirect and ties the response to this attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInPrompt {
    /// Full authorization URL, PKCE challenge included
    pub auth_url: String,
    /// CSRF state parameter embedded in the URL
    pub state: String,
}

/// The outcome the platform hands back after the user finishes the flow.
#[derive(Debug, Clone)]
pub struct SignInResolution {
    /// `state` parameter echoed by the authorization server
    pub state: String,
    /// Email address of the authenticated account
    pub email: String,
    /// Display name, if reported
    pub display_name: Option<String>,
    /// OAuth access token
    pub access_token: String,
    /// Token lifetime in seconds, if reported
    pub expires_in_secs: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(expires_at: Option<i64>) -> AccountHandle {
        AccountHandle {
            email: "user@example.com".to_string(),
            display_name: None,
            access_token: "token".to_string(),
            expires_at,
        }
    }

    #[test]
    fn test_handle_without_expiry_never_expires() {
        assert!(!handle(None).is_expired());
    }

    #[test]
    fn test_handle_expiry_with_buffer() {
        let now = chrono::Utc::now().timestamp();

        // Far-future token is valid
        assert!(!handle(Some(now + 3600)).is_expired());

        // Inside the buffer counts as expired
        assert!(handle(Some(now + 60)).is_expired());

        // Already past is expired
        assert!(handle(Some(now - 10)).is_expired());
    }

    #[test]
    fn test_handle_serialization_roundtrip() {
        let original = handle(Some(12345));
        let json = serde_json::to_string(&original).unwrap();
        let back: AccountHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }
}
