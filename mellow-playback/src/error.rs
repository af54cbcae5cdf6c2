use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Player engine error: {0}")]
    Engine(String),

    #[error("Invalid playback speed: {0}")]
    InvalidSpeed(f32),
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
