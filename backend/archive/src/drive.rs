//! Google Drive v3 adapter.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use infra::TokenProvider;
use scaleslip_core::{ArchiveStore, ArchiveUpload, StoredFile};

pub use scaleslip_core::defaults::DEFAULT_DRIVE_BASE_URL;

/// Archive store backed by Google Drive.
pub struct GoogleDriveStore {
    client: Client,
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
}

impl GoogleDriveStore {
    pub fn new(client: Client, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            tokens,
            base_url: DEFAULT_DRIVE_BASE_URL.to_string(),
        }
    }

    /// Override the API root; uploads go to `{base}/upload/drive/v3`.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let token = self
            .tokens
            .access_token()
            .await
            .context("Failed to obtain Google access token")?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Drive request failed: {what}"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Drive API returned {} for {}: {}", status, what, body);
        }
        Ok(response)
    }
}

#[derive(Serialize)]
struct FileMetadata<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parents: Option<[&'a str; 1]>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedFile {
    id: String,
    #[serde(default)]
    web_view_link: String,
}

/// `multipart/related` body carrying JSON metadata then the media bytes.
fn multipart_related(boundary: &str, metadata: &[u8], mime_type: &str, media: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + media.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata);
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[async_trait]
impl ArchiveStore for GoogleDriveStore {
    async fn create_file(&self, upload: ArchiveUpload) -> Result<StoredFile> {
        let metadata = serde_json::to_vec(&FileMetadata {
            name: &upload.name,
            parents: upload.parent_folder_id.as_deref().map(|p| [p]),
        })
        .context("Failed to encode file metadata")?;

        let boundary = format!("scaleslip-{}", uuid::Uuid::new_v4().simple());
        let body = multipart_related(&boundary, &metadata, &upload.mime_type, &upload.bytes);

        debug!(name = %upload.name, size = upload.bytes.len(), "Uploading slip image");
        let created: CreatedFile = self
            .send(
                self.client
                    .post(format!("{}/upload/drive/v3/files", self.base_url))
                    .query(&[("uploadType", "multipart"), ("fields", "id,webViewLink")])
                    .header(
                        reqwest::header::CONTENT_TYPE,
                        format!("multipart/related; boundary={boundary}"),
                    )
                    .body(body),
                "upload file",
            )
            .await?
            .json()
            .await
            .context("Failed to parse upload response")?;

        info!(name = %upload.name, file_id = %created.id, "Archived slip image");
        Ok(StoredFile {
            id: created.id,
            web_view_link: created.web_view_link,
        })
    }

    async fn grant_public_read(&self, file_id: &str) -> Result<()> {
        self.send(
            self.client
                .post(format!(
                    "{}/drive/v3/files/{}/permissions",
                    self.base_url,
                    file_id_segment(file_id)
                ))
                .json(&json!({ "role": "reader", "type": "anyone" })),
            "grant public read",
        )
        .await?;
        debug!(file_id, "Granted link-reader permission");
        Ok(())
    }
}

/// Drive ids are URL-safe; drop anything that would escape the path segment.
fn file_id_segment(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}
