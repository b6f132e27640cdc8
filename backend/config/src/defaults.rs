//! Config defaults: applies default values to parsed config.

use crate::schema::{
    DriveConfig, GoogleConfig, LoggingConfig, OracleConfig, ServerConfig, SheetsConfig,
    SlipConfig, TokenSource,
};

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_ROUTE: &str = "/lpdawson";

/// Default request body limit (20 MiB).
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 20 * 1024 * 1024;

pub use scaleslip_core::defaults::{
    DEFAULT_DRIVE_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_OPENAI_BASE_URL as DEFAULT_ORACLE_BASE_URL, DEFAULT_SHEETS_BASE_URL,
};
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: SlipConfig) -> SlipConfig {
    let config = apply_server_defaults(config);
    let config = apply_oracle_defaults(config);
    let config = apply_storage_defaults(config);
    let config = apply_google_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: SlipConfig) -> SlipConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    server.body_limit_bytes.get_or_insert(DEFAULT_BODY_LIMIT_BYTES);
    server.route.get_or_insert_with(|| DEFAULT_ROUTE.to_string());
    config
}

fn apply_oracle_defaults(mut config: SlipConfig) -> SlipConfig {
    let oracle = config.oracle.get_or_insert_with(OracleConfig::default);
    oracle.model.get_or_insert_with(|| DEFAULT_MODEL.to_string());
    oracle.base_url.get_or_insert_with(|| DEFAULT_ORACLE_BASE_URL.to_string());
    oracle.max_tokens.get_or_insert(DEFAULT_MAX_TOKENS);
    oracle.timeout_secs.get_or_insert(DEFAULT_ORACLE_TIMEOUT_SECS);
    config
}

fn apply_storage_defaults(mut config: SlipConfig) -> SlipConfig {
    let sheets = config.sheets.get_or_insert_with(SheetsConfig::default);
    sheets.base_url.get_or_insert_with(|| DEFAULT_SHEETS_BASE_URL.to_string());
    let drive = config.drive.get_or_insert_with(DriveConfig::default);
    drive.base_url.get_or_insert_with(|| DEFAULT_DRIVE_BASE_URL.to_string());
    config
}

/// A configured access token implies the static source; otherwise assume
/// the metadata server of the hosting platform.
fn apply_google_defaults(mut config: SlipConfig) -> SlipConfig {
    let google = config.google.get_or_insert_with(GoogleConfig::default);
    if google.token_source.is_none() {
        let has_token = google
            .access_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        google.token_source = Some(if has_token {
            TokenSource::Static
        } else {
            TokenSource::Metadata
        });
    }
    config
}

fn apply_logging_defaults(mut config: SlipConfig) -> SlipConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    config
}
