//! # GemCat Common Library
//!
//! Shared code for the GemCat services including:
//! - The normalized catalog record (`CatalogItem`)
//! - API request/response types
//! - Bootstrap configuration loading
//! - Common error types

pub mod api;
pub mod config;
pub mod error;
pub mod item;

pub use error::{Error, Result};
pub use item::{CatalogItem, RawRow};
