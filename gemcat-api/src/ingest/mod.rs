//! Spreadsheet ingestion pipeline
//!
//! fetch (sheet_client) → decode (decoder) → normalize (normalize)
//!
//! Every catalog request runs the whole pipeline; nothing is cached between
//! requests.

pub mod decoder;
pub mod normalize;
pub mod sheet_client;

use gemcat_common::CatalogItem;
use thiserror::Error;
use tracing::debug;

pub use sheet_client::SheetClient;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// Envelope or payload could not be decoded
    #[error("{0}")]
    Format(String),

    /// Sheet endpoint unreachable or returned non-2xx
    #[error("{0}")]
    UpstreamFetch(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Fetch, decode and normalize the whole sheet
pub async fn load_catalog(client: &SheetClient) -> Result<Vec<CatalogItem>, IngestError> {
    let text = client.fetch_export().await?;
    catalog_from_export(&text)
}

/// Decode and normalize an already fetched export
pub fn catalog_from_export(text: &str) -> Result<Vec<CatalogItem>, IngestError> {
    let rows = decoder::decode(text)?;
    let decoded = rows.len();
    let items = normalize::normalize_rows(rows);
    debug!(decoded, accepted = items.len(), "Normalized sheet rows");
    Ok(items)
}
