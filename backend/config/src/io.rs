//! Config file location and loading.

use crate::schema::SlipConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Config file used when `SCALESLIP_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "scaleslip.yaml";

/// Resolve the config file path.
/// Priority: explicit path > `SCALESLIP_CONFIG` env > `./scaleslip.yaml`
pub fn config_file_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var("SCALESLIP_CONFIG") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist; a deployment
/// configured only through environment variables has no file.
pub async fn load_config(path: &Path) -> Result<SlipConfig> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(SlipConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse YAML text; an empty document is the default config.
pub fn parse_config(raw: &str) -> Result<SlipConfig> {
    if raw.trim().is_empty() {
        return Ok(SlipConfig::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}
