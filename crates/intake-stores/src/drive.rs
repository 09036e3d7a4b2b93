//! Google Drive document store implementation.
//!
//! Each student gets a folder under a configured root; uploads go into the
//! folder (or a named subfolder), and staff receive shareable links.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use intake_core::traits::{DocumentStore, FileMetadata};

use crate::error::StoreError;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Document store backed by Google Drive.
pub struct DriveDocumentStore {
    access_token: String,
    root_folder_id: String,
    base_url: String,
    client: reqwest::Client,
}

impl DriveDocumentStore {
    pub fn new(access_token: &str, root_folder_id: &str, base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            access_token: access_token.to_string(),
            root_folder_id: root_folder_id.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
        }
    }

    async fn search_folder(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<Option<String>, StoreError> {
        let query = format!(
            "name = '{}' and '{}' in parents and mimeType = '{}' and trashed = false",
            name.replace('\'', "\\'"),
            parent_id,
            FOLDER_MIME_TYPE
        );
        let response = self
            .client
            .get(format!("{}/drive/v3/files", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("q", query.as_str()), ("fields", "files(id,name)")])
            .send()
            .await
            .map_err(map_transport_error)?;

        let body: FileList = check_status(response).await?.json().await.map_err(|e| {
            StoreError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            }
        })?;
        Ok(body.files.into_iter().next().map(|f| f.id))
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<String, StoreError> {
        let response = self
            .client
            .post(format!("{}/drive/v3/files", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({
                "name": name,
                "mimeType": FOLDER_MIME_TYPE,
                "parents": [parent_id],
            }))
            .send()
            .await
            .map_err(map_transport_error)?;

        let body: DriveFile = check_status(response).await?.json().await.map_err(|e| {
            StoreError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            }
        })?;
        Ok(body.id)
    }

    async fn find_or_create_folder(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<String, StoreError> {
        if let Some(existing) = self.search_folder(parent_id, name).await? {
            return Ok(existing);
        }
        self.create_folder(parent_id, name).await
    }
}

#[async_trait]
impl DocumentStore for DriveDocumentStore {
    fn name(&self) -> &str {
        "drive"
    }

    #[instrument(skip(self))]
    async fn ensure_folder(&self, student_id: Uuid, name: &str) -> anyhow::Result<String> {
        let folder_name = format!("{name} ({student_id})");
        Ok(self
            .find_or_create_folder(&self.root_folder_id, &folder_name)
            .await?)
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload_file(
        &self,
        folder_id: &str,
        name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
        subfolder: Option<&str>,
    ) -> anyhow::Result<String> {
        let parent = match subfolder {
            Some(sub) => self.find_or_create_folder(folder_id, sub).await?,
            None => folder_id.to_string(),
        };

        // Two-step upload: create the file entry, then push the content
        // with a simple media upload.
        let response = self
            .client
            .post(format!("{}/drive/v3/files", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({
                "name": name,
                "mimeType": mime_type,
                "parents": [parent],
            }))
            .send()
            .await
            .map_err(map_transport_error)?;
        let created: DriveFile = check_status(response).await?.json().await.map_err(|e| {
            StoreError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            }
        })?;

        let response = self
            .client
            .patch(format!(
                "{}/upload/drive/v3/files/{}",
                self.base_url, created.id
            ))
            .bearer_auth(&self.access_token)
            .query(&[("uploadType", "media"), ("fields", "id,webViewLink")])
            .header("content-type", mime_type.to_string())
            .body(bytes)
            .send()
            .await
            .map_err(map_transport_error)?;
        let uploaded: DriveFile = check_status(response).await?.json().await.map_err(|e| {
            StoreError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(uploaded
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view", uploaded.id)))
    }

    async fn list_folder(&self, folder_id: &str) -> anyhow::Result<Vec<FileMetadata>> {
        let query = format!("'{folder_id}' in parents and trashed = false");
        let response = self
            .client
            .get(format!("{}/drive/v3/files", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", query.as_str()),
                (
                    "fields",
                    "files(id,name,mimeType,size,webViewLink,modifiedTime)",
                ),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let body: FileList = check_status(response).await?.json().await.map_err(|e| {
            StoreError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(body
            .files
            .into_iter()
            .map(|f| FileMetadata {
                id: f.id,
                name: f.name.unwrap_or_default(),
                mime_type: f.mime_type.unwrap_or_default(),
                size_bytes: f.size.and_then(|s| s.parse().ok()),
                url: f.web_view_link,
                modified_at: f
                    .modified_time
                    .and_then(|t| chrono::DateTime::parse_from_rfc3339(&t).ok())
                    .map(|t| t.with_timezone(&chrono::Utc)),
            })
            .collect())
    }

    async fn shareable_link(&self, folder_id: &str) -> anyhow::Result<String> {
        // Grant link access before handing the link out.
        let response = self
            .client
            .post(format!(
                "{}/drive/v3/files/{}/permissions",
                self.base_url, folder_id
            ))
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response).await?;

        let response = self
            .client
            .get(format!("{}/drive/v3/files/{}", self.base_url, folder_id))
            .bearer_auth(&self.access_token)
            .query(&[("fields", "id,webViewLink")])
            .send()
            .await
            .map_err(map_transport_error)?;
        let file: DriveFile = check_status(response).await?.json().await.map_err(|e| {
            StoreError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(file
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/drive/folders/{}", file.id)))
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "mimeType")]
    mime_type: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default, rename = "webViewLink")]
    web_view_link: Option<String>,
    #[serde(default, rename = "modifiedTime")]
    modified_time: Option<String>,
}

#[derive(Deserialize)]
struct GoogleError {
    error: GoogleErrorBody,
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    message: String,
}

fn map_transport_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout(DEFAULT_TIMEOUT_SECS)
    } else {
        StoreError::NetworkError(e.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status().as_u16();
    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5)
            * 1000;
        return Err(StoreError::RateLimited {
            retry_after_ms: retry_after,
        });
    }
    if status == 401 || status == 403 {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::AuthenticationFailed(body));
    }
    if status == 404 {
        return Err(StoreError::NotFound("file or folder".into()));
    }
    if status >= 400 {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GoogleError>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(StoreError::ApiError { status, message });
    }
    Ok(response)
}
