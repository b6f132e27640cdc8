//! Config validation: field checks with user-friendly error messages.

use crate::schema::{SlipConfig, TokenSource};
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &SlipConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_oracle(config, &mut report);
    validate_storage(config, &mut report);
    validate_google(config, &mut report);
    report
}

fn validate_server(config: &SlipConfig, report: &mut ValidationReport) {
    let server = config.server();
    if let Some(port) = server.port {
        if port == 0 {
            report.error("server.port", "port must be > 0");
        } else if port < 1024 && port != 80 && port != 443 {
            report.warn(
                "server.port",
                format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
            );
        }
    }
    if let Some(route) = &server.route {
        if !route.starts_with('/') {
            report.error("server.route", format!("Route '{route}' must start with '/'"));
        }
    }
    if server.body_limit_bytes == Some(0) {
        report.error("server.bodyLimitBytes", "bodyLimitBytes must be > 0");
    }
}

fn validate_oracle(config: &SlipConfig, report: &mut ValidationReport) {
    let oracle = config.oracle();
    if is_blank(&oracle.api_key) {
        report.error("oracle.apiKey", "OpenAI API key is required (or set OPENAI_API_KEY)");
    }
    if oracle.max_tokens == Some(0) {
        report.error("oracle.maxTokens", "maxTokens must be >= 1");
    }
}

fn validate_storage(config: &SlipConfig, report: &mut ValidationReport) {
    let sheets = config.sheets();
    if is_blank(&sheets.spreadsheet_id) {
        report.error("sheets.spreadsheetId", "Spreadsheet id is required (or set SHEET_ID)");
    }
    if is_blank(&sheets.worksheet) {
        report.error("sheets.worksheet", "Worksheet name is required (or set SHEET_NAME)");
    }
    if is_blank(&config.drive().folder_id) {
        report.warn(
            "drive.folderId",
            "No archive folder set; images go to the root of the Drive",
        );
    }
}

fn validate_google(config: &SlipConfig, report: &mut ValidationReport) {
    let google = config.google();
    if google.token_source == Some(TokenSource::Static) && is_blank(&google.access_token) {
        report.error(
            "google.accessToken",
            "tokenSource 'static' needs an access token (or set GOOGLE_ACCESS_TOKEN)",
        );
    }
}
