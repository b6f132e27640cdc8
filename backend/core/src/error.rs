use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Maximum number of characters of oracle output carried by a parse failure.
pub const PARSE_EXCERPT_CHARS: usize = 500;

/// The pipeline step a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Intake,
    Extraction,
    Parsing,
    Persistence,
    Archival,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Intake => "intake",
            Stage::Extraction => "extraction",
            Stage::Parsing => "parsing",
            Stage::Persistence => "persistence",
            Stage::Archival => "archival",
        };
        f.write_str(s)
    }
}

/// Every way a slip submission can fail.
#[derive(Debug, Error)]
pub enum SlipError {
    #[error("Unsupported image type: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("vision model call failed: {0}")]
    OracleFailure(String),

    #[error("Failed to parse model response: {reason}")]
    ParseFailure { reason: String, excerpt: String },

    #[error("spreadsheet write failed: {0}")]
    PersistenceFailure(String),

    #[error("archive upload failed: {0}")]
    ArchivalFailure(String),
}

impl SlipError {
    /// Build a parse failure, keeping a bounded excerpt of the offending text.
    pub fn parse(reason: impl Into<String>, text: &str) -> Self {
        Self::ParseFailure {
            reason: reason.into(),
            excerpt: text.chars().take(PARSE_EXCERPT_CHARS).collect(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            SlipError::UnsupportedFormat { .. } => Stage::Intake,
            SlipError::OracleFailure(_) => Stage::Extraction,
            SlipError::ParseFailure { .. } => Stage::Parsing,
            SlipError::PersistenceFailure(_) => Stage::Persistence,
            SlipError::ArchivalFailure(_) => Stage::Archival,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_excerpt_is_truncated() {
        let text = "x".repeat(PARSE_EXCERPT_CHARS * 2);
        match SlipError::parse("no list", &text) {
            SlipError::ParseFailure { excerpt, .. } => {
                assert_eq!(excerpt.chars().count(), PARSE_EXCERPT_CHARS)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn stage_per_variant() {
        let err = SlipError::UnsupportedFormat { extension: ".pdf".into() };
        assert_eq!(err.stage(), Stage::Intake);
        assert_eq!(err.to_string(), "Unsupported image type: .pdf");
        assert_eq!(SlipError::ArchivalFailure("x".into()).stage(), Stage::Archival);
        assert_eq!(Stage::Persistence.to_string(), "persistence");
    }
}
