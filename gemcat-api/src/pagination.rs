//! Pagination utilities for gemcat-api
//!
//! Pages are cut from the normalized item list, so `total` and
//! `total_pages` count accepted records rather than raw sheet rows.

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed, not clamped to `total_pages`)
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Total number of pages
    pub total_pages: u32,
    /// First item index on this page
    pub start: usize,
    /// One past the last item index on this page
    pub end: usize,
}

/// Calculate pagination metadata from total results and requested page
///
/// Pages past the end yield an empty range rather than being clamped.
///
/// # Arguments
/// * `total_results` - Number of normalized items
/// * `page` - Requested page (values below 1 are treated as 1)
/// * `limit` - Page size (values below 1 are treated as 1)
///
/// # Examples
/// ```
/// use gemcat_api::pagination::calculate_pagination;
///
/// // 120 items at 50 per page = 3 pages (50 + 50 + 20)
/// let p = calculate_pagination(120, 2, 50);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!((p.start, p.end), (50, 100));
///
/// // Past the end: empty range
/// let p = calculate_pagination(120, 9, 50);
/// assert_eq!(p.start, p.end);
/// ```
pub fn calculate_pagination(total_results: usize, page: u32, limit: u32) -> Pagination {
    let page = page.max(1);
    let limit = limit.max(1);
    let total_pages = total_results.div_ceil(limit as usize) as u32;

    let start = ((page as usize - 1).saturating_mul(limit as usize)).min(total_results);
    let end = start.saturating_add(limit as usize).min(total_results);

    Pagination {
        page,
        limit,
        total_pages,
        start,
        end,
    }
}

impl Pagination {
    /// Borrow this page's slice of `items`
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.start.min(items.len())..self.end.min(items.len())]
    }
}
