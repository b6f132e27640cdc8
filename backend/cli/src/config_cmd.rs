//! CLI Config Command
//!
//! Prints the effective configuration with secrets masked, then the
//! validation findings.

use anyhow::{Context, Result};
use std::path::Path;

use scaleslip_config::{
    collect_redacted_paths, redact, SlipConfig, ValidationReport, LEGACY_ENV_VARS,
};

use crate::terminal_output::{note_error, note_info, note_success, note_warn};

/// Effective config as YAML with secrets masked.
pub fn render(config: &SlipConfig) -> Result<String> {
    let value = serde_json::to_value(config).context("Failed to serialize config")?;
    serde_yaml::to_string(&redact(&value)).context("Failed to render config as YAML")
}

/// Dotted paths of the fields [`render`] masks.
pub fn masked_fields(config: &SlipConfig) -> Result<Vec<String>> {
    let value = serde_json::to_value(config).context("Failed to serialize config")?;
    Ok(collect_redacted_paths(&value))
}

pub fn run(path: &Path, config: &SlipConfig, report: &ValidationReport) -> Result<()> {
    note_info(&format!("Config file: {}", path.display()));
    println!("{}", render(config)?);

    let masked = masked_fields(config)?;
    if !masked.is_empty() {
        note_info(&format!("Masked: {}", masked.join(", ")));
    }

    for (var, field) in LEGACY_ENV_VARS {
        if std::env::var(var).is_ok_and(|v| !v.trim().is_empty()) {
            note_info(&format!("{field} taken from ${var}"));
        }
    }

    for warning in &report.warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    for error in &report.errors {
        note_error(&format!("{}: {}", error.path, error.message));
    }
    if report.is_valid() {
        note_success("Configuration is complete");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scaleslip_config::{apply_all_defaults, GoogleConfig, OracleConfig};

    #[test]
    fn rendered_config_masks_api_key() {
        let config = apply_all_defaults(SlipConfig {
            oracle: Some(OracleConfig {
                api_key: Some("sk-live-0123456789".into()),
                ..Default::default()
            }),
            ..Default::default()
        });
        let yaml = render(&config).unwrap();
        assert!(yaml.contains("sk-l***"));
        assert!(!yaml.contains("0123456789"));
        assert!(yaml.contains("route: /lpdawson"));
    }

    #[test]
    fn masked_fields_lists_set_secrets_only() {
        let config = apply_all_defaults(SlipConfig {
            oracle: Some(OracleConfig {
                api_key: Some("sk-live-0123456789".into()),
                ..Default::default()
            }),
            google: Some(GoogleConfig {
                access_token: Some("ya29.abc".into()),
                ..Default::default()
            }),
            ..Default::default()
        });
        let mut masked = masked_fields(&config).unwrap();
        masked.sort();
        assert_eq!(masked, vec!["google.accessToken", "oracle.apiKey"]);

        let bare = apply_all_defaults(SlipConfig::default());
        assert!(masked_fields(&bare).unwrap().is_empty());
    }
}
