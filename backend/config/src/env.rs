//! Environment handling for config values.
//!
//! Two mechanisms, applied in this order:
//! - `${VAR}` references inside string values of the config file,
//!   resolved at load time (`$${VAR}` stays a literal `${VAR}`);
//! - the legacy deployment variables (`SHEET_ID`, `OPENAI_API_KEY`, ...),
//!   which override the matching config fields when set.

use std::collections::HashMap;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::warn;

use crate::schema::{
    DriveConfig, GoogleConfig, LoggingConfig, OracleConfig, ServerConfig, SheetsConfig,
    SlipConfig,
};

/// `${NAME}` with an optional leading `$` escape.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a config JSON value tree.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let var_name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Legacy deployment variables and the config field each one overrides.
pub const LEGACY_ENV_VARS: &[(&str, &str)] = &[
    ("SHEET_ID", "sheets.spreadsheetId"),
    ("SHEET_NAME", "sheets.worksheet"),
    ("OPENAI_API_KEY", "oracle.apiKey"),
    ("DRIVE_FOLDER_ID", "drive.folderId"),
    ("GOOGLE_ACCESS_TOKEN", "google.accessToken"),
    ("SCALESLIP_PORT", "server.port"),
    ("SCALESLIP_BIND", "server.bind"),
    ("RUST_LOG", "logging.level"),
];

/// Apply the legacy variables from a provided map. Empty values are ignored.
pub fn apply_env_overlay_with(mut config: SlipConfig, env: &HashMap<String, String>) -> SlipConfig {
    let get = |name: &str| {
        env.get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    if let Some(v) = get("SHEET_ID") {
        config.sheets.get_or_insert_with(SheetsConfig::default).spreadsheet_id = Some(v);
    }
    if let Some(v) = get("SHEET_NAME") {
        config.sheets.get_or_insert_with(SheetsConfig::default).worksheet = Some(v);
    }
    if let Some(v) = get("OPENAI_API_KEY") {
        config.oracle.get_or_insert_with(OracleConfig::default).api_key = Some(v);
    }
    if let Some(v) = get("DRIVE_FOLDER_ID") {
        config.drive.get_or_insert_with(DriveConfig::default).folder_id = Some(v);
    }
    if let Some(v) = get("GOOGLE_ACCESS_TOKEN") {
        config.google.get_or_insert_with(GoogleConfig::default).access_token = Some(v);
    }
    if let Some(v) = get("SCALESLIP_PORT") {
        match v.parse::<u16>() {
            Ok(port) => {
                config.server.get_or_insert_with(ServerConfig::default).port = Some(port);
            }
            Err(_) => warn!(value = %v, "Ignoring SCALESLIP_PORT: not a port number"),
        }
    }
    if let Some(v) = get("SCALESLIP_BIND") {
        config.server.get_or_insert_with(ServerConfig::default).bind = Some(v);
    }
    if let Some(v) = get("RUST_LOG") {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(v);
    }
    config
}
