//! Google Sheets v4 adapter.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use infra::TokenProvider;
use scaleslip_core::{WorksheetRef, WorksheetStore};

pub use scaleslip_core::defaults::DEFAULT_SHEETS_BASE_URL;

/// Grid size of a newly created tab.
pub const NEW_WORKSHEET_ROWS: u32 = 1000;
pub const NEW_WORKSHEET_COLUMNS: u32 = 20;

/// `batchUpdate` body creating a tab with the default grid size.
fn add_sheet_request(title: &str) -> Value {
    json!({
        "requests": [{
            "addSheet": {
                "properties": {
                    "title": title,
                    "gridProperties": {
                        "rowCount": NEW_WORKSHEET_ROWS,
                        "columnCount": NEW_WORKSHEET_COLUMNS,
                    }
                }
            }
        }]
    })
}

/// Worksheet store backed by the Google Sheets REST API.
pub struct GoogleSheetsStore {
    client: Client,
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
}

impl GoogleSheetsStore {
    pub fn new(client: Client, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            tokens,
            base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn values_url(&self, worksheet: &WorksheetRef, range: &str, suffix: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}{}",
            self.base_url,
            worksheet.spreadsheet_id,
            urlencoding::encode(range),
            suffix
        )
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let token = self
            .tokens
            .access_token()
            .await
            .context("Failed to obtain Google access token")?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Sheets request failed: {what}"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Sheets API returned {} for {}: {}", status, what, body);
        }
        Ok(response)
    }
}

/// A1 reference to a whole tab, quoting the title as Sheets requires.
fn tab_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl WorksheetStore for GoogleSheetsStore {
    async fn ensure_worksheet(&self, worksheet: &WorksheetRef) -> Result<()> {
        let url = format!("{}/spreadsheets/{}", self.base_url, worksheet.spreadsheet_id);
        let meta: SpreadsheetMeta = self
            .send(
                self.client
                    .get(&url)
                    .query(&[("fields", "sheets.properties.title")]),
                "open spreadsheet",
            )
            .await?
            .json()
            .await
            .context("Failed to parse spreadsheet metadata")?;

        if meta.sheets.iter().any(|s| s.properties.title == worksheet.title) {
            debug!(worksheet = %worksheet, "Worksheet exists");
            return Ok(());
        }

        self.send(
            self.client
                .post(format!("{url}:batchUpdate"))
                .json(&add_sheet_request(&worksheet.title)),
            "add worksheet",
        )
        .await?;
        info!(worksheet = %worksheet, "Created worksheet");
        Ok(())
    }

    async fn read_all_rows(&self, worksheet: &WorksheetRef) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(worksheet, &tab_range(&worksheet.title), "");
        let range: ValueRange = self
            .send(self.client.get(&url), "read rows")
            .await?
            .json()
            .await
            .context("Failed to parse worksheet values")?;

        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn append_row(&self, worksheet: &WorksheetRef, row: &[String]) -> Result<()> {
        let range = format!("{}!A1", tab_range(&worksheet.title));
        let url = self.values_url(worksheet, &range, ":append");
        let body = json!({ "majorDimension": "ROWS", "values": [row] });
        self.send(
            self.client
                .post(&url)
                .query(&[("valueInputOption", "RAW")])
                .json(&body),
            "append row",
        )
        .await?;
        Ok(())
    }

    async fn replace_header_row(&self, worksheet: &WorksheetRef, headers: &[String]) -> Result<()> {
        let range = format!("{}!A1", tab_range(&worksheet.title));
        let url = self.values_url(worksheet, &range, "");
        let body = json!({ "majorDimension": "ROWS", "values": [headers] });
        self.send(
            self.client
                .put(&url)
                .query(&[("valueInputOption", "RAW")])
                .json(&body),
            "replace header row",
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infra::StaticToken;

    fn store() -> GoogleSheetsStore {
        GoogleSheetsStore::new(Client::new(), Arc::new(StaticToken::new("t")))
            .with_base_url("http://sheets.test/v4/")
    }

    #[test]
    fn tab_range_quotes_title() {
        assert_eq!(tab_range("West"), "'West'");
        assert_eq!(tab_range("Bob's Yard"), "'Bob''s Yard'");
    }

    #[test]
    fn values_url_encodes_range() {
        let ws = WorksheetRef::new("abc123", "West Side");
        let url = store().values_url(&ws, "'West Side'!A1", ":append");
        assert_eq!(
            url,
            "http://sheets.test/v4/spreadsheets/abc123/values/%27West%20Side%27%21A1:append"
        );
    }

    #[test]
    fn add_sheet_request_sets_title_and_grid() {
        let body = add_sheet_request("West Side");
        let props = &body["requests"][0]["addSheet"]["properties"];
        assert_eq!(props["title"], "West Side");
        assert_eq!(props["gridProperties"]["rowCount"], 1000);
        assert_eq!(props["gridProperties"]["columnCount"], 20);
        assert_eq!(body["requests"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn value_range_without_values_is_empty() {
        let parsed: ValueRange = serde_json::from_str(r#"{"range":"'West'!A1:Z1000"}"#).unwrap();
        assert!(parsed.values.is_empty());
    }

    #[test]
    fn non_string_cells_become_text() {
        assert_eq!(cell_text(json!("x")), "x");
        assert_eq!(cell_text(json!(42)), "42");
        assert_eq!(cell_text(Value::Null), "");
    }

    #[test]
    fn spreadsheet_meta_lists_titles() {
        let raw = r#"{"sheets":[{"properties":{"title":"West"}},{"properties":{"title":"East"}}]}"#;
        let meta: SpreadsheetMeta = serde_json::from_str(raw).unwrap();
        let titles: Vec<_> = meta.sheets.iter().map(|s| s.properties.title.as_str()).collect();
        assert_eq!(titles, vec!["West", "East"]);
    }
}
