//! # Google Drive Provider
//!
//! Implements the `StorageProvider` catalog seam for Google Drive API v3:
//! - Paginated audio-file listing filtered by MIME type and file extension
//! - File metadata, download-URL resolution, and content downloads
//! - Folder browsing with folders sorted before files
//! - Exponential backoff for rate limiting and transient server errors
//!
//! The connector must be bound to an authenticated account via
//! [`GoogleDriveConnector::initialize`] before any remote call; earlier
//! calls are reported as errors, never panics.

pub mod connector;
pub mod error;
pub mod filter;
pub mod types;

pub use connector::GoogleDriveConnector;
pub use error::{GoogleDriveError, Result};
pub use filter::{is_audio_file, AUDIO_EXTENSIONS, AUDIO_MIME_TYPES};
