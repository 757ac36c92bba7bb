//! Catalog API with pagination
//!
//! `GET /api/diamonds?page=<n>&limit=<n>` fetches the sheet, normalizes it,
//! and returns one page of the accepted records.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use gemcat_common::api::{CatalogPage, ErrorBody, PageQuery};
use tracing::{debug, warn};

use crate::ingest::{self, IngestError};
use crate::pagination::calculate_pagination;
use crate::AppState;

/// Cache-Control on successful pages
const NO_STORE_SUCCESS: &str = "no-store, max-age=0";

/// Cache-Control on error responses
const NO_STORE: &str = "no-store";

/// GET /api/diamonds
///
/// Returns one page of normalized catalog items.
pub async fn get_catalog_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Response, CatalogError> {
    let page = query.page();
    let limit = query.limit();

    let items = ingest::load_catalog(&state.sheet).await?;

    let p = calculate_pagination(items.len(), page, limit);
    debug!(
        page = p.page,
        limit = p.limit,
        total = items.len(),
        total_pages = p.total_pages,
        "Serving catalog page"
    );

    let body = CatalogPage {
        items: p.slice(&items).to_vec(),
        page: p.page,
        limit: p.limit,
        total: items.len() as u64,
        total_pages: p.total_pages,
        updated_at: Utc::now(),
    };

    Ok(([(header::CACHE_CONTROL, NO_STORE_SUCCESS)], Json(body)).into_response())
}

/// Catalog API errors
#[derive(Debug)]
pub enum CatalogError {
    /// Upstream sheet unavailable (502)
    Upstream(String),
    /// Sheet payload could not be decoded (500)
    Decode(String),
}

impl From<IngestError> for CatalogError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::UpstreamFetch(msg) => CatalogError::Upstream(msg),
            other => CatalogError::Decode(other.to_string()),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            CatalogError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            CatalogError::Decode(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        warn!(status = status.as_u16(), error = %message, "Catalog request failed");

        (
            status,
            [(header::CACHE_CONTROL, NO_STORE)],
            Json(ErrorBody::new(message)),
        )
            .into_response()
    }
}
