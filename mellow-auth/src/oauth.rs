//! Authorization URL construction with PKCE (RFC 7636).
//!
//! Only the challenge derived from the verifier ever leaves the process;
//! the verifier itself stays with the pending sign-in attempt. Verifier and
//! state values are never logged.

use crate::error::{AuthError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use mellow_runtime::config::OAuthSettings;
use rand::Rng;
use sha2::{Digest, Sha256};
use url::Url;

/// PKCE code verifier plus the CSRF state for one sign-in attempt.
#[derive(Debug, Clone)]
pub struct PkceVerifier {
    verifier: String,
    state: String,
}

impl PkceVerifier {
    /// Generate a verifier (32 random bytes) and state (16 random bytes),
    /// both URL-safe base64 without padding.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();

        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);
        let state = URL_SAFE_NO_PAD.encode(state_bytes);

        Self { verifier, state }
    }

    /// The code verifier string.
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// The state parameter.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Compute the S256 code challenge: BASE64URL(SHA256(verifier)).
    pub fn challenge(&self) -> String {
        let digest = Sha256::digest(self.verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }
}

impl Default for PkceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the full authorization URL for the configured provider.
pub fn build_authorization_url(config: &OAuthSettings, pkce: &PkceVerifier) -> Result<String> {
    if config.client_id.trim().is_empty() {
        return Err(AuthError::InvalidConfig(
            "client_id is not configured".to_string(),
        ));
    }

    let mut url = Url::parse(&config.auth_url)
        .map_err(|e| AuthError::InvalidConfig(format!("auth_url: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &config.scopes.join(" "))
        .append_pair("state", pkce.state())
        .append_pair("code_challenge", &pkce.challenge())
        .append_pair("code_challenge_method", "S256");

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OAuthSettings {
        OAuthSettings {
            client_id: "client-123".to_string(),
            ..OAuthSettings::default()
        }
    }

    #[test]
    fn test_verifier_lengths() {
        let pkce = PkceVerifier::new();
        // 32 bytes -> 43 base64url chars, within RFC 7636's 43..128 range
        assert_eq!(pkce.verifier().len(), 43);
        assert_eq!(pkce.state().len(), 22);
    }

    #[test]
    fn test_verifiers_are_unique() {
        let a = PkceVerifier::new();
        let b = PkceVerifier::new();
        assert_ne!(a.verifier(), b.verifier());
        assert_ne!(a.state(), b.state());
    }

    #[test]
    fn test_challenge_is_deterministic() {
        let pkce = PkceVerifier::new();
        assert_eq!(pkce.challenge(), pkce.challenge());
        assert_ne!(pkce.challenge(), pkce.verifier());
    }

    #[test]
    fn test_authorization_url_contains_required_params() {
        let pkce = PkceVerifier::new();
        let url = build_authorization_url(&config(), &pkce).unwrap();

        let parsed = Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().collect();

        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["state"], pkce.state());
        assert!(params["scope"].contains("drive.readonly"));
    }

    #[test]
    fn test_missing_client_id_is_rejected() {
        let pkce = PkceVerifier::new();
        let result = build_authorization_url(&OAuthSettings::default(), &pkce);
        assert!(matches!(result, Err(AuthError::InvalidConfig(_))));
    }
}
