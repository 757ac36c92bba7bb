//! HTTP API handlers for gemcat-api

pub mod catalog;
pub mod health;

pub use catalog::{get_catalog_page, CatalogError};
pub use health::health_routes;
