//! Google Drive v3 implementation of [`RemoteDrive`].

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};

use crate::auth::Authenticator;
use crate::error::{DriveError, Result};
use crate::models::{ApiErrorResponse, FileListResponse, FileMetadata};
use crate::remote::{MediaStream, RemoteDrive};

/// Base URL for Google Drive API v3.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Fields requested for every listed child.
const LIST_FIELDS: &str = "nextPageToken, files(id, name, size, mimeType, shortcutDetails)";

/// Fields requested for single-item lookups.
const ITEM_FIELDS: &str = "id, name, size, mimeType";

/// Largest page the API accepts.
const PAGE_SIZE: &str = "1000";

/// Read-only Drive client. Works across My Drive and shared drives.
pub struct DriveClient {
    auth: Authenticator,
    http: Client,
    base_url: String,
    acknowledge_abuse: bool,
}

impl DriveClient {
    /// Create a client whose connections and reads time out after `timeout`.
    pub fn new(auth: Authenticator, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;

        Ok(Self {
            auth,
            http,
            base_url: DRIVE_API_BASE.to_string(),
            acknowledge_abuse: true,
        })
    }

    /// Point the client at another API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether binary downloads acknowledge abuse warnings.
    pub fn with_acknowledge_abuse(mut self, acknowledge: bool) -> Self {
        self.acknowledge_abuse = acknowledge;
        self
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.auth.get_access_token().await?;
        let response = request.bearer_auth(&token).send().await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(api_error(response).await)
        }
    }

    async fn open_media(&self, request: RequestBuilder) -> Result<MediaStream> {
        let response = self.authorized(request).await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(DriveError::from))
            .boxed())
    }
}

/// Turn a non-success response into an `ApiError`, preferring the
/// structured Google error body when present.
async fn api_error(response: Response) -> DriveError {
    let status = response.status();
    let error_body = response.text().await.unwrap_or_default();

    if let Ok(body) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
        let reason = body.error.reason();
        return DriveError::ApiError {
            status: body.error.code,
            reason,
            message: body.error.message,
        };
    }

    DriveError::ApiError {
        status: status.as_u16(),
        reason: None,
        message: error_body,
    }
}

#[async_trait]
impl RemoteDrive for DriveClient {
    async fn list_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<FileListResponse> {
        let query = format!("'{}' in parents and trashed = false", folder_id);
        let mut request = self.http.get(format!("{}/files", self.base_url)).query(&[
            ("q", query.as_str()),
            ("fields", LIST_FIELDS),
            ("pageSize", PAGE_SIZE),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = self.authorized(request).await?;
        let page: FileListResponse = response.json().await?;
        tracing::debug!(
            folder_id,
            files = page.files.len(),
            more = page.next_page_token.is_some(),
            "Fetched listing page"
        );
        Ok(page)
    }

    async fn get_item(&self, id: &str) -> Result<FileMetadata> {
        let request = self
            .http
            .get(format!("{}/files/{}", self.base_url, id))
            .query(&[("supportsAllDrives", "true"), ("fields", ITEM_FIELDS)]);

        let response = self.authorized(request).await?;
        Ok(response.json().await?)
    }

    async fn open_download(&self, id: &str) -> Result<MediaStream> {
        let mut request = self
            .http
            .get(format!("{}/files/{}", self.base_url, id))
            .query(&[("alt", "media"), ("supportsAllDrives", "true")]);

        if self.acknowledge_abuse {
            request = request.query(&[("acknowledgeAbuse", "true")]);
        }

        self.open_media(request).await
    }

    async fn open_export(&self, id: &str, mime_type: &str) -> Result<MediaStream> {
        let request = self
            .http
            .get(format!("{}/files/{}/export", self.base_url, id))
            .query(&[("mimeType", mime_type)]);

        self.open_media(request).await
    }
}
