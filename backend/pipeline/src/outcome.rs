use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use scaleslip_core::{ExtractedRecord, SlipError, Stage, StoredFile};

/// One submitted slip image.
#[derive(Debug, Clone)]
pub struct SlipUpload {
    pub filename: String,
    pub bytes: Bytes,
}

impl SlipUpload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// A fully processed slip.
#[derive(Debug, Clone)]
pub struct SlipReceipt {
    pub record: ExtractedRecord,
    /// Name the image was archived under.
    pub filename: String,
    pub stored: StoredFile,
    pub header_written: bool,
}

/// Side effects that had already landed when a submission failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub header_written: bool,
    pub row_appended: bool,
}

/// A failed submission: what went wrong and how far it got.
#[derive(Debug)]
pub struct SlipFailure {
    pub error: SlipError,
    pub progress: Progress,
}

impl SlipFailure {
    pub fn new(error: SlipError, progress: Progress) -> Self {
        Self { error, progress }
    }

    pub fn stage(&self) -> Stage {
        self.error.stage()
    }
}

impl From<SlipError> for SlipFailure {
    fn from(error: SlipError) -> Self {
        Self::new(error, Progress::default())
    }
}

impl fmt::Display for SlipFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for SlipFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
