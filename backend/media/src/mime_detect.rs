//! MIME type detection for uploaded slip images.
//!
//! Only the formats the vision model is fed are recognized; everything else
//! is rejected before any external call.

use serde::Serialize;

use scaleslip_core::SlipError;

/// Image formats accepted for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlipFormat {
    Jpeg,
    Png,
}

impl SlipFormat {
    /// Detect by extension (with leading dot, any case).
    pub fn from_extension(extension: &str) -> Result<Self, SlipError> {
        match extension.to_lowercase().as_str() {
            ".jpg" | ".jpeg" => Ok(Self::Jpeg),
            ".png" => Ok(Self::Png),
            _ => Err(SlipError::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    pub fn from_filename(filename: &str) -> Result<Self, SlipError> {
        Self::from_extension(split_extension(filename))
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Extension of the last path component, including the dot; `""` if none.
///
/// Leading dots do not start an extension (`.hidden` has none).
pub fn split_extension(filename: &str) -> &str {
    let base_start = filename.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let base = &filename[base_start..];
    let stem_len = base.len() - base.trim_start_matches('.').len();
    match base[stem_len..].rfind('.') {
        Some(i) => &base[stem_len + i..],
        None => "",
    }
}
