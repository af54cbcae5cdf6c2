//! Platform-boundary abstractions shared by every core crate.
//!
//! The traits here isolate the core from anything the host environment owns:
//! HTTP transport, credential storage, and the cloud catalog a provider crate
//! implements. Implementations never panic across the boundary; every
//! fallible operation returns a [`Result`].

pub mod error;
pub mod http;
pub mod storage;

pub use error::{BridgeError, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use storage::{FilePage, RemoteFile, SecureStore, StorageProvider};
