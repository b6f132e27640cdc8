//! `scaleslip-config`: runtime configuration for the slip service.
//!
//! Provides:
//! - Typed config schema (server, oracle, sheets, drive, google, logging)
//! - YAML loading
//! - `${ENV_VAR}` substitution and the legacy environment overlay
//! - Config redaction for safe display
//! - Default value application
//! - Validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_env_overlay_with, resolve_env_vars_with, MissingEnvVarError, LEGACY_ENV_VARS};
pub use io::{config_file_path, load_config, parse_config};
pub use redact::{collect_redacted_paths, redact};
pub use schema::{
    DriveConfig, GoogleConfig, LoggingConfig, OracleConfig, ServerConfig, SheetsConfig,
    SlipConfig, TokenSource,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use std::collections::HashMap;

/// Emit validation findings through `tracing`.
pub fn log_report(report: &ValidationReport) {
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
}

/// Substitute env vars, overlay the legacy variables, apply defaults, and
/// validate a freshly loaded config.
///
/// Callers decide whether validation errors are fatal.
pub fn prepare(
    raw_config: SlipConfig,
    env: &HashMap<String, String>,
) -> Result<(SlipConfig, ValidationReport)> {
    let value = serde_json::to_value(&raw_config)
        .context("Failed to serialize config for processing")?;
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;
    let config: SlipConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_env_overlay_with(config, env);
    let config = apply_all_defaults(config);
    let report = validate(&config);
    Ok((config, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn env_only_deployment_is_valid() {
        let env = env(&[
            ("SHEET_ID", "sheet-1"),
            ("SHEET_NAME", "West"),
            ("OPENAI_API_KEY", "sk-x"),
            ("DRIVE_FOLDER_ID", "folder"),
        ]);
        let (config, report) = prepare(SlipConfig::default(), &env).unwrap();
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert_eq!(config.server().port, Some(defaults::DEFAULT_PORT));
        assert_eq!(config.sheets().worksheet.as_deref(), Some("West"));
    }

    #[test]
    fn file_references_are_substituted_before_defaults() {
        let raw = parse_config(
            "oracle:\n  apiKey: ${MY_KEY}\nsheets:\n  spreadsheetId: s\n  worksheet: W\n",
        )
        .unwrap();
        let (config, report) = prepare(raw, &env(&[("MY_KEY", "sk-from-env")])).unwrap();
        assert!(report.is_valid());
        assert_eq!(config.oracle().api_key.as_deref(), Some("sk-from-env"));
        assert_eq!(config.oracle().model.as_deref(), Some(defaults::DEFAULT_MODEL));
    }

    #[test]
    fn unresolved_reference_is_error() {
        let raw = parse_config("oracle:\n  apiKey: ${NOT_SET_ANYWHERE}\n").unwrap();
        assert!(prepare(raw, &HashMap::new()).is_err());
    }
}
