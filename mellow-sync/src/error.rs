use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Catalog provider error: {0}")]
    Provider(#[from] mellow_bridge::error::BridgeError),

    #[error("Library error: {0}")]
    Library(#[from] mellow_library::LibraryError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
