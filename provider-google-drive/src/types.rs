//! Google Drive API response types
//!
//! Data structures for deserializing Google Drive API v3 responses.

use serde::{Deserialize, Serialize};

/// Google Drive API file resource
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID
    pub id: String,

    /// File name
    pub name: String,

    /// MIME type
    pub mime_type: String,

    /// File size in bytes as a decimal string (omitted for folders)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Creation time (RFC 3339)
    #[serde(default)]
    pub created_time: Option<String>,

    /// Modification time (RFC 3339)
    #[serde(default)]
    pub modified_time: Option<String>,

    /// Parent folder IDs
    #[serde(default)]
    pub parents: Vec<String>,

    /// Direct content link, when exposed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_content_link: Option<String>,

    /// Thumbnail image link, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_link: Option<String>,

    /// Whether the file is trashed
    #[serde(default)]
    pub trashed: bool,
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    /// List of files
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Token for next page, absent on the last page
    pub next_page_token: Option<String>,
}

/// Partial file resource used when only the content link is requested.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentLinkResponse {
    pub web_content_link: Option<String>,
}
