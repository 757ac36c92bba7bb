//! Local search, categorical filters and sort order
//!
//! Everything here runs over the accumulated item collection on every filter
//! change; nothing is persisted.

use gemcat_common::CatalogItem;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Categorical filter value that matches every record
pub const ALL: &str = "All";

/// Sort applied after filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Keep accumulation order
    #[default]
    None,
    PriceAsc,
    PriceDesc,
    WeightAsc,
    WeightDesc,
}

#[derive(Debug, Error)]
#[error("unknown sort order '{0}' (expected none, price-asc, price-desc, weight-asc or weight-desc)")]
pub struct ParseSortOrderError(String);

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(SortOrder::None),
            "price-asc" => Ok(SortOrder::PriceAsc),
            "price-desc" => Ok(SortOrder::PriceDesc),
            "weight-asc" => Ok(SortOrder::WeightAsc),
            "weight-desc" => Ok(SortOrder::WeightDesc),
            _ => Err(ParseSortOrderError(s.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortOrder::None => "none",
            SortOrder::PriceAsc => "price-asc",
            SortOrder::PriceDesc => "price-desc",
            SortOrder::WeightAsc => "weight-asc",
            SortOrder::WeightDesc => "weight-desc",
        };
        f.write_str(name)
    }
}

impl SortOrder {
    /// Compare two records; a missing number compares as 0
    fn compare(self, a: &CatalogItem, b: &CatalogItem) -> Ordering {
        let key = |item: &CatalogItem| match self {
            SortOrder::PriceAsc | SortOrder::PriceDesc => item.price_per_ct.unwrap_or(0.0),
            SortOrder::WeightAsc | SortOrder::WeightDesc => item.weight.unwrap_or(0.0),
            SortOrder::None => 0.0,
        };
        let ord = key(a).total_cmp(&key(b));
        match self {
            SortOrder::PriceDesc | SortOrder::WeightDesc => ord.reverse(),
            _ => ord,
        }
    }
}

/// Active search text, categorical filters and sort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub query: String,
    pub shape: String,
    pub color: String,
    pub clarity: String,
    pub cut: String,
    pub sort: SortOrder,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            shape: ALL.to_string(),
            color: ALL.to_string(),
            clarity: ALL.to_string(),
            cut: ALL.to_string(),
            sort: SortOrder::None,
        }
    }
}

impl FilterState {
    /// True if `item` passes the text query and every categorical filter
    pub fn matches(&self, item: &CatalogItem) -> bool {
        self.matches_query(item)
            && category_matches(&self.shape, &item.shape)
            && category_matches(&self.color, &item.color)
            && category_matches(&self.clarity, &item.clarity)
            && category_matches(&self.cut, &item.cut)
    }

    fn matches_query(&self, item: &CatalogItem) -> bool {
        let q = self.query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        [
            &item.stock,
            &item.report,
            &item.shape,
            &item.color,
            &item.clarity,
        ]
        .iter()
        .filter(|v| !v.is_empty())
        .any(|v| v.to_lowercase().contains(&q))
    }

    /// Filter then sort; the sort is stable so ties keep collection order
    pub fn apply<'a, I>(&self, items: I) -> Vec<&'a CatalogItem>
    where
        I: IntoIterator<Item = &'a CatalogItem>,
    {
        let mut visible: Vec<&CatalogItem> =
            items.into_iter().filter(|item| self.matches(item)).collect();
        if self.sort != SortOrder::None {
            visible.sort_by(|a, b| self.sort.compare(a, b));
        }
        visible
    }
}

/// Exact, case-sensitive match unless the filter is the `All` sentinel
fn category_matches(filter: &str, value: &str) -> bool {
    filter == ALL || filter == value
}

/// Choices for each categorical filter, each starting with `All`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub shapes: Vec<String>,
    pub colors: Vec<String>,
    pub clarities: Vec<String>,
    pub cuts: Vec<String>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self::from_items(std::iter::empty())
    }
}

impl FilterOptions {
    /// Distinct non-empty values present in `items`, sorted
    pub fn from_items<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a CatalogItem>,
    {
        let mut shapes = BTreeSet::new();
        let mut colors = BTreeSet::new();
        let mut clarities = BTreeSet::new();
        let mut cuts = BTreeSet::new();

        for item in items {
            for (set, value) in [
                (&mut shapes, &item.shape),
                (&mut colors, &item.color),
                (&mut clarities, &item.clarity),
                (&mut cuts, &item.cut),
            ] {
                if !value.is_empty() {
                    set.insert(value.clone());
                }
            }
        }

        Self {
            shapes: with_all(shapes),
            colors: with_all(colors),
            clarities: with_all(clarities),
            cuts: with_all(cuts),
        }
    }
}

fn with_all(values: BTreeSet<String>) -> Vec<String> {
    std::iter::once(ALL.to_string()).chain(values).collect()
}
