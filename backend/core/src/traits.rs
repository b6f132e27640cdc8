use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Trait for vision-capable completion services used to read slips.
///
/// The service is treated as a black box: image in, free-form text out.
#[async_trait]
pub trait VisionOracle: Send + Sync {
    /// Provider name (e.g., "openai", "mock").
    fn name(&self) -> &str;

    /// Send the image with the instruction and return the reply text.
    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse>;
}

/// Request to a vision oracle.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub model: String,
    pub prompt: String,
    pub image: Bytes,
    pub mime_type: String,
    pub max_tokens: u32,
}

/// Response from a vision oracle.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

/// A named tab inside a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorksheetRef {
    pub spreadsheet_id: String,
    pub title: String,
}

impl WorksheetRef {
    pub fn new(spreadsheet_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            title: title.into(),
        }
    }
}

impl fmt::Display for WorksheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.spreadsheet_id, self.title)
    }
}

/// Narrow interface onto a spreadsheet back end.
///
/// Implementations must preserve row and column order exactly as written.
#[async_trait]
pub trait WorksheetStore: Send + Sync {
    /// Open the spreadsheet and create the tab if it does not exist yet.
    async fn ensure_worksheet(&self, worksheet: &WorksheetRef) -> Result<()>;

    /// Every non-trailing-empty row of the tab; row 0 is the header row.
    async fn read_all_rows(&self, worksheet: &WorksheetRef) -> Result<Vec<Vec<String>>>;

    /// Append one row after the last non-empty row.
    async fn append_row(&self, worksheet: &WorksheetRef, row: &[String]) -> Result<()>;

    /// Overwrite row 0 in full.
    async fn replace_header_row(&self, worksheet: &WorksheetRef, headers: &[String]) -> Result<()>;
}

/// A file handed to the archive.
#[derive(Debug, Clone)]
pub struct ArchiveUpload {
    pub bytes: Bytes,
    pub name: String,
    pub mime_type: String,
    pub parent_folder_id: Option<String>,
}

/// Remote identity of an archived file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: String,
    pub web_view_link: String,
}

/// Narrow interface onto the object store holding original slip images.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    async fn create_file(&self, upload: ArchiveUpload) -> Result<StoredFile>;

    /// Make the file readable by anyone holding the link.
    async fn grant_public_read(&self, file_id: &str) -> Result<()>;
}
