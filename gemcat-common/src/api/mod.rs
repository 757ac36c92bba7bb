//! API module for shared HTTP API types
//!
//! Shared by the catalog server (gemcat-api) and its clients (gemcat-browse).
//! Contains ONLY plain serde types, no HTTP framework dependencies.

pub mod types;

pub use types::{CatalogPage, ErrorBody, PageQuery, DEFAULT_LIMIT, MAX_LIMIT};
