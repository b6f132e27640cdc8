//! CLI Status Command
//!
//! Asks a running server for its health report.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::terminal_output::{note_error, note_success, render_pairs};

pub async fn run(base_url: &str) -> Result<()> {
    let url = format!("{}/api/health", base_url.trim_end_matches('/'));
    let response = match reqwest::Client::new().get(&url).send().await {
        Ok(resp) => resp,
        Err(e) => {
            note_error(&format!("scaleslip is not reachable at {base_url}: {e}"));
            return Ok(());
        }
    };

    let body: Value = response
        .json()
        .await
        .context("Health endpoint returned non-JSON")?;
    note_success(&format!("scaleslip is up at {base_url}"));

    let rows: Vec<(String, String)> = body
        .as_object()
        .map(|map| {
            map.iter()
                .map(|(k, v)| (k.clone(), v.as_str().map_or_else(|| v.to_string(), str::to_string)))
                .collect()
        })
        .unwrap_or_default();
    print!(
        "{}",
        render_pairs(("Key", "Value"), rows.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    );
    Ok(())
}
