//! Spreadsheet export client
//!
//! Issues the GET against the GViz export endpoint chosen by [`SheetConfig`].

use gemcat_common::config::SheetConfig;
use std::time::Duration;

use super::IngestError;

const USER_AGENT: &str = concat!("gemcat/", env!("CARGO_PKG_VERSION"));

/// Spreadsheet export client
#[derive(Debug, Clone)]
pub struct SheetClient {
    http_client: reqwest::Client,
    export_url: String,
}

impl SheetClient {
    /// Create a client for the configured sheet
    pub fn new(sheet: &SheetConfig, timeout: Duration) -> Result<Self, IngestError> {
        Self::with_url(sheet.export_url(), timeout)
    }

    /// Create a client against an explicit export URL
    pub fn with_url(export_url: impl Into<String>, timeout: Duration) -> Result<Self, IngestError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| IngestError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            export_url: export_url.into(),
        })
    }

    pub fn export_url(&self) -> &str {
        &self.export_url
    }

    /// Fetch the raw export text
    pub async fn fetch_export(&self) -> Result<String, IngestError> {
        tracing::debug!(url = %self.export_url, "Fetching sheet export");

        let response = self
            .http_client
            .get(&self.export_url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| IngestError::UpstreamFetch(format!("Failed to fetch sheet: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::UpstreamFetch(format!(
                "Failed to fetch sheet: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }

        response
            .text()
            .await
            .map_err(|e| IngestError::UpstreamFetch(format!("Failed to read sheet body: {}", e)))
    }
}
