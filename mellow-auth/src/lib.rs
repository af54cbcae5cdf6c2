//! # Identity Session
//!
//! Obtains, caches, and releases the single authenticated cloud-drive
//! account the rest of the core runs against. The session owns no song
//! data; it produces an opaque [`AccountHandle`] the catalog provider
//! consumes.

pub mod account_store;
pub mod error;
pub mod oauth;
pub mod session;
pub mod types;

pub use error::{AuthError, Result};
pub use session::IdentitySession;
pub use types::{AccountHandle, SignInPrompt, SignInResolution};
