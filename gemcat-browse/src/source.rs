//! Page sources for the browse session
//!
//! [`PageSource`] is the seam between the state machine and the network.
//! [`HttpPageSource`] talks to a running gemcat-api.

use async_trait::async_trait;
use gemcat_common::api::{CatalogPage, ErrorBody};
use gemcat_common::CatalogItem;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::view::ImageLoadError;

const USER_AGENT: &str = concat!("gemcat-browse/", env!("CARGO_PKG_VERSION"));

/// Client-side fetch errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// API unreachable
    #[error("Network error: {0}")]
    Network(String),

    /// API answered with a non-2xx status
    #[error("API {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not a catalog page
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Anything that can serve catalog pages
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one 1-based page of `limit` items
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<CatalogPage, FetchError>;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for Arc<T> {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<CatalogPage, FetchError> {
        (**self).fetch_page(page, limit).await
    }
}

/// Catalog API client
pub struct HttpPageSource {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpPageSource {
    /// Create client for the API at `base_url` (e.g. `http://127.0.0.1:5780`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn page_url(&self, page: u32, limit: u32) -> String {
        format!("{}/api/diamonds?page={}&limit={}", self.base_url, page, limit)
    }

    /// Check that `item`'s still image is reachable
    pub async fn check_image(&self, item: &CatalogItem) -> Result<(), ImageLoadError> {
        if item.image_url.is_empty() {
            return Err(ImageLoadError::new(item, "no image link"));
        }

        let response = self
            .http_client
            .head(&item.image_url)
            .send()
            .await
            .map_err(|e| ImageLoadError::new(item, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageLoadError::new(item, status.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<CatalogPage, FetchError> {
        let url = self.page_url(page, limit);
        tracing::debug!(page, limit, url = %url, "Fetching catalog page");

        let response = self
            .http_client
            .get(&url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("").to_string());
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let catalog_page: CatalogPage = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        tracing::debug!(
            page = catalog_page.page,
            items = catalog_page.items.len(),
            total_pages = catalog_page.total_pages,
            "Catalog page received"
        );

        Ok(catalog_page)
    }
}
