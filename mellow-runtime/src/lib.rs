//! # Runtime Module
//!
//! Foundational infrastructure the rest of the player core depends on:
//! - Event bus for decoupled communication between modules
//! - Logging and tracing bootstrap
//! - Application configuration

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use events::EventBus;
