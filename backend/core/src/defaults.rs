//! Deployment defaults shared by the adapters and the config layer.

/// Vision model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o";
/// Completion budget for one slip reading.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";
/// Drive uploads live under `/upload`, metadata calls under `/drive`.
pub const DEFAULT_DRIVE_BASE_URL: &str = "https://www.googleapis.com";
