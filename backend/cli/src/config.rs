//! Turns a prepared [`SlipConfig`] into live adapters and the pipeline.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::info;

use infra::{build_http_client, GcloudCliToken, MetadataServerToken, StaticToken, TokenProvider};
use scaleslip_archive::GoogleDriveStore;
use scaleslip_config::{GoogleConfig, SlipConfig, TokenSource};
use scaleslip_core::WorksheetRef;
use scaleslip_ledger::GoogleSheetsStore;
use scaleslip_pipeline::{PipelineSettings, SlipPipeline};
use scaleslip_understanding::OpenAiVisionOracle;

/// Per-request timeout for Sheets and Drive calls.
const GOOGLE_TIMEOUT_SECS: u64 = 60;

fn required(value: Option<String>, path: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("{path} is not configured"))
}

pub fn token_provider(google: &GoogleConfig, client: Client) -> Arc<dyn TokenProvider> {
    match google.token_source.unwrap_or(TokenSource::Metadata) {
        TokenSource::Static => Arc::new(StaticToken::new(
            google.access_token.clone().unwrap_or_default(),
        )),
        TokenSource::Metadata => Arc::new(MetadataServerToken::new(client)),
        TokenSource::Gcloud => Arc::new(GcloudCliToken::new()),
    }
}

/// Build the pipeline with the OpenAI oracle and the Google adapters.
pub fn build_pipeline(config: &SlipConfig) -> Result<SlipPipeline> {
    let oracle_cfg = config.oracle();
    let sheets_cfg = config.sheets();
    let drive_cfg = config.drive();

    let oracle_client = build_http_client(oracle_cfg.timeout_secs.map(Duration::from_secs))?;
    let google_client = build_http_client(Some(Duration::from_secs(GOOGLE_TIMEOUT_SECS)))?;

    let mut oracle = OpenAiVisionOracle::new(required(oracle_cfg.api_key, "oracle.apiKey")?)
        .with_client(oracle_client);
    if let Some(url) = &oracle_cfg.base_url {
        oracle = oracle.with_base_url(url);
    }

    let tokens = token_provider(&config.google(), google_client.clone());
    info!(source = tokens.name(), "Google token source");

    let mut sheets = GoogleSheetsStore::new(google_client.clone(), tokens.clone());
    if let Some(url) = &sheets_cfg.base_url {
        sheets = sheets.with_base_url(url);
    }
    let mut drive = GoogleDriveStore::new(google_client, tokens);
    if let Some(url) = &drive_cfg.base_url {
        drive = drive.with_base_url(url);
    }

    let worksheet = WorksheetRef::new(
        required(sheets_cfg.spreadsheet_id, "sheets.spreadsheetId")?,
        required(sheets_cfg.worksheet, "sheets.worksheet")?,
    );
    let mut settings = PipelineSettings::new(worksheet);
    if let Some(model) = oracle_cfg.model {
        settings.model = model;
    }
    if let Some(max_tokens) = oracle_cfg.max_tokens {
        settings.max_tokens = max_tokens;
    }
    settings.drive_folder_id = drive_cfg.folder_id.filter(|f| !f.trim().is_empty());

    Ok(SlipPipeline::new(
        Arc::new(oracle),
        Arc::new(sheets),
        Arc::new(drive),
        settings,
    ))
}
