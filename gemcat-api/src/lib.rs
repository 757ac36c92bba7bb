//! gemcat-api library - catalog ingestion and HTTP API
//!
//! Reads the inventory spreadsheet, normalizes its rows into
//! `CatalogItem`s and serves them page by page.

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod ingest;
pub mod pagination;

use ingest::SheetClient;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Spreadsheet export client
    pub sheet: SheetClient,
}

impl AppState {
    /// Create new application state
    pub fn new(sheet: SheetClient) -> Self {
        Self { sheet }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/api/diamonds", get(api::get_catalog_page))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
