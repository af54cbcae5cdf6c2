use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("OAuth configuration invalid: {0}")]
    InvalidConfig(String),

    #[error("No sign-in attempt is pending")]
    NoPendingSignIn,

    #[error("Authorization state mismatch")]
    StateMismatch,

    #[error("Credential storage error: {0}")]
    Storage(#[from] mellow_bridge::error::BridgeError),

    #[error("Stored account is corrupted: {0}")]
    CorruptedAccount(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
