//! Cloud catalog and credential storage abstractions.
//!
//! [`StorageProvider`] is the seam between the core and a concrete cloud
//! backend: it yields pages of file descriptors plus their binary contents.
//! [`SecureStore`] abstracts where token material lives (keychain, keystore,
//! encrypted file); [`MemorySecureStore`] backs tests and ephemeral setups.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Result;

/// A file or folder descriptor as reported by a cloud storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Provider-assigned file identifier
    pub id: String,
    /// File name including extension
    pub name: String,
    /// MIME type, if the provider reports one
    pub mime_type: Option<String>,
    /// Size in bytes (absent for folders)
    pub size: Option<i64>,
    /// Parent folder identifiers
    pub parent_ids: Vec<String>,
    /// Creation time, Unix milliseconds
    pub created_at: Option<i64>,
    /// Last modification time, Unix milliseconds
    pub modified_at: Option<i64>,
    /// Direct content link, if exposed by the provider
    pub content_link: Option<String>,
    /// Thumbnail image link, if available
    pub thumbnail_link: Option<String>,
    /// Whether the entry is a folder
    pub is_folder: bool,
    /// Whether the entry sits in the provider's trash
    pub trashed: bool,
}

/// One page of a paginated file listing.
///
/// `next_page_token` is `None` on the last page.
#[derive(Debug, Clone, Default)]
pub struct FilePage {
    pub files: Vec<RemoteFile>,
    pub next_page_token: Option<String>,
}

/// Cloud catalog provider trait.
///
/// Every operation returns a `Result`; transport failures carry the
/// underlying error message and never propagate as panics. Listings are
/// ordered by name so pagination stays deterministic across calls.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// List one page of audio files visible to the bound account.
    ///
    /// The provider applies its audio filter (MIME type or file extension)
    /// and excludes trashed entries.
    async fn list_audio_files(
        &self,
        page_token: Option<String>,
        page_size: u32,
    ) -> Result<FilePage>;

    /// Fetch the full descriptor for a single file.
    async fn get_metadata(&self, file_id: &str) -> Result<RemoteFile>;

    /// Resolve a direct download URL for a file.
    ///
    /// Returns `Ok(None)` when the provider exposes no content link.
    async fn get_download_url(&self, file_id: &str) -> Result<Option<String>>;

    /// Download a file's raw bytes.
    async fn download(&self, file_id: &str) -> Result<Bytes>;

    /// List a folder's direct children, unfiltered.
    ///
    /// Folders sort before files, then by name.
    async fn list_folder_contents(&self, folder_id: &str) -> Result<Vec<RemoteFile>>;
}

/// Secure credential storage trait
///
/// Implementations must encrypt data at rest and never log secret values.
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Store a secret value, replacing any previous value under the key.
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a secret value. Returns `Ok(None)` if the key doesn't exist.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a secret. Deleting a missing key is not an error.
    async fn delete_secret(&self, key: &str) -> Result<()>;

    /// Check if a secret exists without retrieving it
    async fn has_secret(&self, key: &str) -> Result<bool> {
        Ok(self.get_secret(key).await?.is_some())
    }
}

/// In-memory [`SecureStore`] for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemorySecureStore {
    secrets: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySecureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecureStore for MemorySecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        self.secrets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .secrets
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned())
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        self.secrets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}
