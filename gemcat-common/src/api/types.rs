//! Shared API request/response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::CatalogItem;

/// Page size used when the request does not name one
pub const DEFAULT_LIMIT: u32 = 50;

/// Largest page size the catalog API will serve
pub const MAX_LIMIT: u32 = 500;

// ========================================
// Request Types
// ========================================

/// Paging parameters for `GET /api/diamonds`
///
/// Values arrive as raw strings so that garbage input falls back to the
/// defaults instead of rejecting the request.
///
/// # Examples
///
/// ```
/// use gemcat_common::api::types::PageQuery;
///
/// let q = PageQuery { page: Some("2".into()), limit: Some("abc".into()) };
/// assert_eq!(q.page(), 2);
/// assert_eq!(q.limit(), 50);
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    /// 1-based page number; anything below 1 or unparseable becomes 1
    pub fn page(&self) -> u32 {
        parse_leading_int(self.page.as_deref())
            .map(|p| p.max(1))
            .unwrap_or(1)
            .min(u32::MAX as i64) as u32
    }

    /// Page size clamped to `1..=MAX_LIMIT`
    pub fn limit(&self) -> u32 {
        parse_leading_int(self.limit.as_deref())
            .map(|l| l.clamp(1, MAX_LIMIT as i64) as u32)
            .unwrap_or(DEFAULT_LIMIT)
    }
}

/// Integer parse that tolerates trailing junk ("2abc" → 2) and saturates on overflow
fn parse_leading_int(value: Option<&str>) -> Option<i64> {
    let value = value?.trim();
    let (sign, digits) = match value.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, value.strip_prefix('+').unwrap_or(value)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // All ASCII digits, so the only parse failure is overflow
    let n = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * n)
}

// ========================================
// Response Types
// ========================================

/// One page of normalized catalog items
///
/// `total` and `total_pages` count normalized records, not raw sheet rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub updated_at: DateTime<Utc>,
}

/// Error response body for every failing API request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
