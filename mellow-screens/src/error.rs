use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenError {
    #[error("Configuration error: {0}")]
    Config(#[from] mellow_runtime::Error),

    #[error("Library error: {0}")]
    Library(#[from] mellow_library::LibraryError),
}

pub type Result<T> = std::result::Result<T, ScreenError>;
