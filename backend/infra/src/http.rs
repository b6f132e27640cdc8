use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

/// Build the HTTP client shared by every outbound adapter.
///
/// `timeout` bounds each whole request; `None` leaves it to the transport.
pub fn build_http_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder().user_agent(concat!("scaleslip/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("Failed to build HTTP client")
}
