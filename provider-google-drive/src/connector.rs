//! Google Drive API connector implementation
//!
//! Implements the `StorageProvider` trait for Google Drive API v3.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::DateTime;
use mellow_auth::AccountHandle;
use mellow_bridge::error::Result as BridgeResult;
use mellow_bridge::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use mellow_bridge::storage::{FilePage, RemoteFile, StorageProvider};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::error::{GoogleDriveError, Result};
use crate::filter::audio_query;
use crate::types::{ContentLinkResponse, DriveFile, FilesListResponse};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Maximum results per page (Google Drive API limit)
const MAX_PAGE_SIZE: u32 = 1000;

/// Fields to request for file resources
const FILE_FIELDS: &str =
    "id,name,mimeType,size,parents,createdTime,modifiedTime,webContentLink,thumbnailLink,trashed";

/// MIME type Drive uses for folders
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Google Drive API connector
///
/// The connector is created unbound and must be initialized with an
/// authenticated [`AccountHandle`] before issuing remote calls. Calls on an
/// unbound connector report `NotInitialized`; nothing panics.
pub struct GoogleDriveConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// The bound account, set by `initialize`. Re-initializing replaces it.
    account: RwLock<Option<AccountHandle>>,
}

impl GoogleDriveConnector {
    /// Create an unbound connector.
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            account: RwLock::new(None),
        }
    }

    /// Bind the connector to an authenticated account.
    ///
    /// Must be called before any listing or download operation. Calling it
    /// again replaces the previous binding.
    pub fn initialize(&self, account: AccountHandle) {
        info!(email = %account.email, "Binding Drive connector to account");
        *self.account.write().unwrap_or_else(|e| e.into_inner()) = Some(account);
    }

    /// Whether an account is currently bound.
    pub fn is_initialized(&self) -> bool {
        self.account
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn auth_header(&self) -> Result<String> {
        let guard = self.account.read().unwrap_or_else(|e| e.into_inner());
        let account = guard.as_ref().ok_or(GoogleDriveError::NotInitialized)?;
        Ok(format!("Bearer {}", account.access_token))
    }

    /// Parse an RFC 3339 timestamp into Unix milliseconds.
    fn parse_timestamp(rfc3339: &str) -> Option<i64> {
        DateTime::parse_from_rfc3339(rfc3339)
            .ok()
            .map(|dt| dt.timestamp_millis())
    }

    /// Convert a Drive file resource into the provider-neutral descriptor.
    fn convert_file(drive_file: DriveFile) -> RemoteFile {
        let is_folder = drive_file.mime_type == FOLDER_MIME_TYPE;

        RemoteFile {
            id: drive_file.id,
            name: drive_file.name,
            size: drive_file.size.and_then(|s| s.parse().ok()),
            parent_ids: drive_file.parents,
            created_at: drive_file
                .created_time
                .as_deref()
                .and_then(Self::parse_timestamp),
            modified_at: drive_file
                .modified_time
                .as_deref()
                .and_then(Self::parse_timestamp),
            content_link: drive_file.web_content_link,
            thumbnail_link: drive_file.thumbnail_link,
            mime_type: Some(drive_file.mime_type),
            is_folder,
            trashed: drive_file.trashed,
        }
    }

    /// Execute a GET request with retry logic.
    ///
    /// Rate limiting (429) and server errors (5xx) back off exponentially;
    /// client errors surface immediately.
    #[instrument(skip(self), fields(url = %url))]
    async fn execute_with_retry(&self, url: String, max_retries: u32) -> Result<HttpResponse> {
        let auth = self.auth_header()?;
        let mut attempt = 0;

        loop {
            let mut headers = HashMap::new();
            headers.insert("Authorization".to_string(), auth.clone());
            headers.insert("Accept".to_string(), "application/json".to_string());

            let request = HttpRequest {
                method: HttpMethod::Get,
                url: url.clone(),
                headers,
                body: None,
                timeout: Some(std::time::Duration::from_secs(30)),
            };

            match self.http_client.execute(request).await {
                Ok(response) => {
                    let status = response.status;

                    if status == 200 {
                        debug!("API request succeeded: status={}", status);
                        return Ok(response);
                    } else if status == 429 || (500..600).contains(&status) {
                        attempt += 1;
                        if attempt >= max_retries {
                            warn!(
                                "API request failed after {} attempts: status={}",
                                max_retries, status
                            );
                            return Err(GoogleDriveError::ApiError {
                                status_code: status,
                                message: format!("Request failed after {} retries", max_retries),
                            });
                        }

                        let backoff_ms = 100u64 * 2u64.pow(attempt);
                        warn!(
                            "API request failed (attempt {}/{}): status={}, retrying in {}ms",
                            attempt, max_retries, status, backoff_ms
                        );
                        tokio::time::sleep(tokio::time::Duration::from_millis(backoff_ms)).await;
                    } else {
                        warn!("API request failed: status={}", status);
                        return Err(GoogleDriveError::ApiError {
                            status_code: status,
                            message: String::from_utf8_lossy(&response.body).to_string(),
                        });
                    }
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries {
                        warn!("API request failed after {} attempts: {}", max_retries, e);
                        return Err(e.into());
                    }

                    let backoff_ms = 100u64 * 2u64.pow(attempt);
                    warn!(
                        "API request failed (attempt {}/{}): {}, retrying in {}ms",
                        attempt, max_retries, e, backoff_ms
                    );
                    tokio::time::sleep(tokio::time::Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }

    async fn list_audio_files_inner(
        &self,
        page_token: Option<String>,
        page_size: u32,
    ) -> Result<FilePage> {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);

        // Ordered by name so pagination stays deterministic
        let mut url = format!(
            "{}/files?q={}&orderBy=name&pageSize={}&fields=nextPageToken,files({})",
            DRIVE_API_BASE,
            urlencoding::encode(&audio_query()),
            page_size,
            FILE_FIELDS
        );

        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(&token)));
        }

        let response = self.execute_with_retry(url, 3).await?;

        let list_response: FilesListResponse =
            serde_json::from_slice(&response.body).map_err(|e| {
                GoogleDriveError::ParseError(format!("Failed to parse files list response: {}", e))
            })?;

        let files: Vec<RemoteFile> = list_response
            .files
            .into_iter()
            .map(Self::convert_file)
            .collect();

        info!("Listed {} audio files from Google Drive", files.len());

        Ok(FilePage {
            files,
            next_page_token: list_response.next_page_token,
        })
    }

    async fn get_metadata_inner(&self, file_id: &str) -> Result<RemoteFile> {
        let url = format!("{}/files/{}?fields={}", DRIVE_API_BASE, file_id, FILE_FIELDS);

        let response = self.execute_with_retry(url, 3).await?;

        let drive_file: DriveFile = serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse file metadata: {}", e))
        })?;

        Ok(Self::convert_file(drive_file))
    }

    async fn get_download_url_inner(&self, file_id: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/files/{}?fields=webContentLink",
            DRIVE_API_BASE, file_id
        );

        let response = self.execute_with_retry(url, 3).await?;

        let link: ContentLinkResponse = serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse content link: {}", e))
        })?;

        Ok(link.web_content_link)
    }

    async fn download_inner(&self, file_id: &str) -> Result<Bytes> {
        let auth = self.auth_header()?;
        let url = format!("{}/files/{}?alt=media", DRIVE_API_BASE, file_id);

        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), auth);

        let request = HttpRequest {
            method: HttpMethod::Get,
            url,
            headers,
            body: None,
            timeout: Some(std::time::Duration::from_secs(60)),
        };

        let response = self.http_client.execute(request).await?;

        if response.status == 200 || response.status == 206 {
            info!("Downloaded {} bytes", response.body.len());
            Ok(response.body)
        } else {
            Err(GoogleDriveError::ApiError {
                status_code: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            })
        }
    }

    async fn list_folder_contents_inner(&self, folder_id: &str) -> Result<Vec<RemoteFile>> {
        let query = format!("'{}' in parents and trashed=false", folder_id);
        let url = format!(
            "{}/files?q={}&orderBy=folder,name&pageSize={}&fields=nextPageToken,files({})",
            DRIVE_API_BASE,
            urlencoding::encode(&query),
            MAX_PAGE_SIZE,
            FILE_FIELDS
        );

        let response = self.execute_with_retry(url, 3).await?;

        let list_response: FilesListResponse =
            serde_json::from_slice(&response.body).map_err(|e| {
                GoogleDriveError::ParseError(format!("Failed to parse folder listing: {}", e))
            })?;

        let mut files: Vec<RemoteFile> = list_response
            .files
            .into_iter()
            .map(Self::convert_file)
            .collect();

        // Folders before files, then by name
        files.sort_by(|a, b| {
            b.is_folder
                .cmp(&a.is_folder)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(files)
    }
}

#[async_trait]
impl StorageProvider for GoogleDriveConnector {
    #[instrument(skip(self))]
    async fn list_audio_files(
        &self,
        page_token: Option<String>,
        page_size: u32,
    ) -> BridgeResult<FilePage> {
        Ok(self.list_audio_files_inner(page_token, page_size).await?)
    }

    #[instrument(skip(self), fields(file_id = %file_id))]
    async fn get_metadata(&self, file_id: &str) -> BridgeResult<RemoteFile> {
        Ok(self.get_metadata_inner(file_id).await?)
    }

    #[instrument(skip(self), fields(file_id = %file_id))]
    async fn get_download_url(&self, file_id: &str) -> BridgeResult<Option<String>> {
        Ok(self.get_download_url_inner(file_id).await?)
    }

    #[instrument(skip(self), fields(file_id = %file_id))]
    async fn download(&self, file_id: &str) -> BridgeResult<Bytes> {
        Ok(self.download_inner(file_id).await?)
    }

    #[instrument(skip(self), fields(folder_id = %folder_id))]
    async fn list_folder_contents(&self, folder_id: &str) -> BridgeResult<Vec<RemoteFile>> {
        Ok(self.list_folder_contents_inner(folder_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mellow_bridge::error::BridgeError;
    use mockall::mock;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn account() -> AccountHandle {
        AccountHandle {
            email: "user@example.com".to_string(),
            display_name: None,
            access_token: "test_token".to_string(),
            expires_at: None,
        }
    }

    fn bound(mock_http: MockHttpClient) -> GoogleDriveConnector {
        let connector = GoogleDriveConnector::new(Arc::new(mock_http));
        connector.initialize(account());
        connector
    }

    fn json_response(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body.as_bytes().to_vec()),
        }
    }

    #[tokio::test]
    async fn test_operations_before_initialize_are_reported() {
        let connector = GoogleDriveConnector::new(Arc::new(MockHttpClient::new()));
        assert!(!connector.is_initialized());

        let result = connector.list_audio_files(None, 100).await;
        assert!(matches!(result, Err(BridgeError::NotAvailable(_))));

        let result = connector.download("file1").await;
        assert!(matches!(result, Err(BridgeError::NotAvailable(_))));

        let result = connector.get_download_url("file1").await;
        assert!(matches!(result, Err(BridgeError::NotAvailable(_))));
    }

    #[test]
    fn test_convert_file() {
        let drive_file = DriveFile {
            id: "file123".to_string(),
            name: "test.mp3".to_string(),
            mime_type: "audio/mpeg".to_string(),
            size: Some("1024".to_string()),
            created_time: Some("2023-01-01T00:00:00.000Z".to_string()),
            modified_time: Some("2023-01-02T00:00:00.000Z".to_string()),
            parents: vec!["folder1".to_string()],
            web_content_link: Some("https://drive.google.com/uc?id=file123".to_string()),
            thumbnail_link: None,
            trashed: false,
        };

        let remote_file = GoogleDriveConnector::convert_file(drive_file);

        assert_eq!(remote_file.id, "file123");
        assert_eq!(remote_file.name, "test.mp3");
        assert_eq!(remote_file.mime_type, Some("audio/mpeg".to_string()));
        assert_eq!(remote_file.size, Some(1024));
        assert!(!remote_file.is_folder);
        assert_eq!(remote_file.created_at, Some(1672531200000));
        assert!(remote_file.content_link.is_some());
    }

    #[test]
    fn test_convert_folder() {
        let drive_folder = DriveFile {
            id: "folder123".to_string(),
            name: "Music".to_string(),
            mime_type: "application/vnd.google-apps.folder".to_string(),
            size: None,
            created_time: None,
            modified_time: None,
            parents: vec![],
            web_content_link: None,
            thumbnail_link: None,
            trashed: false,
        };

        let remote_file = GoogleDriveConnector::convert_file(drive_folder);

        assert!(remote_file.is_folder);
        assert_eq!(remote_file.size, None);
        assert_eq!(remote_file.created_at, None);
    }

    #[tokio::test]
    async fn test_list_audio_files_success() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|req| {
            // The audio filter and deterministic ordering ride in the URL
            assert!(req.url.contains("orderBy=name"));
            assert!(req.url.contains("trashed")); // encoded filter query
            assert!(req.headers.contains_key("Authorization"));

            Ok(json_response(
                r#"{
                    "files": [
                        {
                            "id": "file1",
                            "name": "song.mp3",
                            "mimeType": "audio/mpeg",
                            "size": "1024",
                            "createdTime": "2024-01-01T00:00:00.000Z",
                            "modifiedTime": "2024-01-01T00:00:00.000Z",
                            "parents": ["parent1"],
                            "trashed": false
                        }
                    ],
                    "nextPageToken": "next_page"
                }"#,
            ))
        });

        let connector = bound(mock_http);
        let page = connector.list_audio_files(None, 100).await.unwrap();

        assert_eq!(page.files.len(), 1);
        assert_eq!(page.files[0].id, "file1");
        assert_eq!(page.files[0].name, "song.mp3");
        assert_eq!(page.next_page_token, Some("next_page".to_string()));
    }

    #[tokio::test]
    async fn test_list_audio_files_passes_page_token() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.contains("pageToken=abc"));
            Ok(json_response(r#"{"files": []}"#))
        });

        let connector = bound(mock_http);
        let page = connector
            .list_audio_files(Some("abc".to_string()), 100)
            .await
            .unwrap();

        assert!(page.files.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_get_metadata_success() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                r#"{
                    "id": "file1",
                    "name": "song.mp3",
                    "mimeType": "audio/mpeg",
                    "size": "1024",
                    "createdTime": "2024-01-01T00:00:00.000Z",
                    "modifiedTime": "2024-01-01T00:00:00.000Z",
                    "parents": ["parent1"],
                    "trashed": false
                }"#,
            ))
        });

        let connector = bound(mock_http);
        let file = connector.get_metadata("file1").await.unwrap();

        assert_eq!(file.id, "file1");
        assert_eq!(file.mime_type, Some("audio/mpeg".to_string()));
    }

    #[tokio::test]
    async fn test_get_download_url() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.contains("fields=webContentLink"));
            Ok(json_response(
                r#"{"webContentLink": "https://drive.google.com/uc?id=file1"}"#,
            ))
        });

        let connector = bound(mock_http);
        let url = connector.get_download_url("file1").await.unwrap();
        assert_eq!(
            url,
            Some("https://drive.google.com/uc?id=file1".to_string())
        );
    }

    #[tokio::test]
    async fn test_get_download_url_absent() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(json_response("{}")));

        let connector = bound(mock_http);
        let url = connector.get_download_url("file1").await.unwrap();
        assert_eq!(url, None);
    }

    #[tokio::test]
    async fn test_download_success() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.headers.contains_key("Authorization"));
            assert!(req.url.contains("alt=media"));

            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: Bytes::from(vec![1, 2, 3, 4, 5]),
            })
        });

        let connector = bound(mock_http);
        let data = connector.download("file1").await.unwrap();

        assert_eq!(data.len(), 5);
        assert_eq!(&data[..], &[1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_folder_contents_sorted_folders_first() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.contains("in%20parents"));
            Ok(json_response(
                r#"{
                    "files": [
                        {"id": "f2", "name": "b.mp3", "mimeType": "audio/mpeg"},
                        {"id": "d1", "name": "Zebra Albums", "mimeType": "application/vnd.google-apps.folder"},
                        {"id": "f1", "name": "a.mp3", "mimeType": "audio/mpeg"},
                        {"id": "d2", "name": "Ambient", "mimeType": "application/vnd.google-apps.folder"}
                    ]
                }"#,
            ))
        });

        let connector = bound(mock_http);
        let files = connector.list_folder_contents("root").await.unwrap();

        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Ambient", "Zebra Albums", "a.mp3", "b.mp3"]);
    }

    #[tokio::test]
    async fn test_api_error_handling() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 404,
                headers: HashMap::new(),
                body: Bytes::from(b"File not found".to_vec()),
            })
        });

        let connector = bound(mock_http);
        let result = connector.get_metadata("nonexistent").await;

        assert!(result.is_err());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("404"));
    }

    #[tokio::test]
    async fn test_parse_error_is_reported() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(json_response("not json at all")));

        let connector = bound(mock_http);
        let result = connector.list_audio_files(None, 100).await;
        assert!(result.is_err());
    }
}
