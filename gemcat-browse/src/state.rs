//! Catalog aggregation state machine
//!
//! `Idle → Loading(1) → Loaded(1) → Loading(2) → … → Exhausted`, with
//! `Error` reachable from every fetch. The machine never performs I/O: each
//! transition that needs a fetch hands back a [`PageRequest`], and the
//! caller reports the outcome through [`CatalogState::complete`].
//!
//! At most one request is in flight. Completed pages live in a cache keyed
//! by page index; the accumulated collection is those pages concatenated in
//! index order, so earlier data survives a failed later page.

use chrono::{DateTime, Utc};
use gemcat_common::api::CatalogPage;
use gemcat_common::CatalogItem;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, warn};

use crate::filter::{FilterOptions, FilterState};
use crate::source::FetchError;

/// Where the browse session currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPhase {
    /// Nothing requested yet
    Idle,
    /// A fetch for `page` is in flight
    Loading { page: u32 },
    /// `pages` pages cached, more available
    Loaded { pages: u32 },
    /// Every page the API reported has been loaded
    Exhausted { pages: u32 },
    /// The fetch for `page` failed; cached pages are kept
    Error { page: u32, message: String },
}

/// Why a page is being fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Next page appended to the collection
    Append,
    /// Re-fetch of an already cached page
    Revalidate,
}

/// A fetch the caller should perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub kind: RequestKind,
}

/// Accumulated pages, load phase and filter state
#[derive(Debug, Clone)]
pub struct CatalogState {
    page_size: u32,
    phase: LoadPhase,
    /// Completed pages keyed by 1-based index
    pages: BTreeMap<u32, CatalogPage>,
    /// Page count reported by the most recent response
    total_pages: Option<u32>,
    in_flight: Option<PageRequest>,
    /// Cached pages still to re-fetch in the current revalidation pass
    revalidate_queue: VecDeque<u32>,
    /// Manual refresh asked for while a fetch was in flight
    refresh_pending: bool,
    filter: FilterState,
    options: FilterOptions,
}

impl CatalogState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            phase: LoadPhase::Idle,
            pages: BTreeMap::new(),
            total_pages: None,
            in_flight: None,
            revalidate_queue: VecDeque::new(),
            refresh_pending: false,
            filter: FilterState::default(),
            options: FilterOptions::default(),
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Number of cached pages
    pub fn loaded_pages(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Page count from the latest response, if any arrived
    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    /// True once the last reported page is cached
    pub fn is_exhausted(&self) -> bool {
        match self.total_pages {
            Some(total) => self.last_loaded_page() >= total,
            None => false,
        }
    }

    /// `updatedAt` of the first page
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.pages.get(&1).map(|p| p.updated_at)
    }

    /// Accumulated collection in page order
    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.pages.values().flat_map(|p| p.items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.pages.values().map(|p| p.items.len()).sum()
    }

    /// Filtered and sorted view of the accumulated collection
    pub fn visible(&self) -> Vec<&CatalogItem> {
        self.filter.apply(self.items())
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Current filter choices; refreshed whenever the collection changes
    pub fn filter_options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            LoadPhase::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    fn last_loaded_page(&self) -> u32 {
        self.pages.keys().next_back().copied().unwrap_or(0)
    }

    // ---------------------------------------------------------------------
    // Filter updates
    // ---------------------------------------------------------------------

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
    }

    pub fn filter_mut(&mut self) -> &mut FilterState {
        &mut self.filter
    }

    // ---------------------------------------------------------------------
    // Triggers
    // ---------------------------------------------------------------------

    /// First load: request page 1 from `Idle`
    pub fn initial_load(&mut self) -> Option<PageRequest> {
        if self.phase != LoadPhase::Idle || self.in_flight.is_some() {
            return None;
        }
        Some(self.start(1, RequestKind::Append))
    }

    /// "Load more" button or sentinel: request the next page
    ///
    /// No-op while a fetch is in flight or once exhausted. After an error
    /// this retries the page that failed, even when it was a cached page.
    pub fn load_more(&mut self) -> Option<PageRequest> {
        if self.in_flight.is_some() {
            debug!("Load more ignored: fetch in flight");
            return None;
        }
        if let LoadPhase::Error { page, .. } = self.phase {
            let kind = if self.pages.contains_key(&page) {
                RequestKind::Revalidate
            } else {
                RequestKind::Append
            };
            return Some(self.start(page, kind));
        }
        if self.is_exhausted() {
            return None;
        }
        let next = self.last_loaded_page() + 1;
        Some(self.start(next, RequestKind::Append))
    }

    /// Sentinel near the end of the rendered list became visible
    pub fn sentinel_visible(&mut self) -> Option<PageRequest> {
        self.load_more()
    }

    /// Manual refresh: re-fetch every cached page
    ///
    /// If a fetch is in flight the refresh starts as soon as it settles.
    pub fn refresh(&mut self) -> Option<PageRequest> {
        if self.in_flight.is_some() {
            self.refresh_pending = true;
            return None;
        }
        self.begin_revalidation()
    }

    /// Timer tick: re-fetch cached pages unless busy
    ///
    /// Ticks that arrive during a fetch are dropped.
    pub fn auto_refresh_tick(&mut self) -> Option<PageRequest> {
        if self.phase == LoadPhase::Idle
            || self.in_flight.is_some()
            || !self.revalidate_queue.is_empty()
        {
            return None;
        }
        self.begin_revalidation()
    }

    /// Window or terminal regained focus; same rules as a timer tick
    pub fn focus_regained(&mut self) -> Option<PageRequest> {
        self.auto_refresh_tick()
    }

    /// Record the outcome of `request`
    ///
    /// Returns the next fetch to perform, if the transition queued one.
    pub fn complete(
        &mut self,
        request: PageRequest,
        result: Result<CatalogPage, FetchError>,
    ) -> Option<PageRequest> {
        if self.in_flight != Some(request) {
            warn!(page = request.page, "Ignoring result for request not in flight");
            return None;
        }
        self.in_flight = None;

        match result {
            Ok(page) => self.accept_page(request, page),
            Err(err) => {
                warn!(page = request.page, error = %err, "Catalog page fetch failed");
                self.revalidate_queue.clear();
                self.phase = LoadPhase::Error {
                    page: request.page,
                    message: err.to_string(),
                };
            }
        }

        if self.refresh_pending {
            self.refresh_pending = false;
            return self.begin_revalidation();
        }

        match self.revalidate_queue.pop_front() {
            Some(next) => Some(self.start(next, RequestKind::Revalidate)),
            None => None,
        }
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn start(&mut self, page: u32, kind: RequestKind) -> PageRequest {
        let request = PageRequest {
            page,
            limit: self.page_size,
            kind,
        };
        self.in_flight = Some(request);
        self.phase = LoadPhase::Loading { page };
        request
    }

    fn begin_revalidation(&mut self) -> Option<PageRequest> {
        if self.pages.is_empty() {
            // Nothing cached yet: a refresh is a (re)try of page 1
            return Some(self.start(1, RequestKind::Append));
        }
        self.revalidate_queue = self.pages.keys().copied().collect();
        let first = self.revalidate_queue.pop_front()?;
        debug!(pages = self.pages.len(), "Revalidating cached pages");
        Some(self.start(first, RequestKind::Revalidate))
    }

    fn accept_page(&mut self, request: PageRequest, page: CatalogPage) {
        let total = page.total_pages;
        self.total_pages = Some(total);
        self.pages.insert(request.page, page);

        // The sheet shrank: cached pages past the new end are stale
        let stale: Vec<u32> = self
            .pages
            .keys()
            .copied()
            .filter(|p| *p > total.max(1))
            .collect();
        for p in &stale {
            self.pages.remove(p);
        }
        self.revalidate_queue.retain(|p| *p <= total.max(1));

        self.options = FilterOptions::from_items(self.items());

        let pages = self.loaded_pages();
        self.phase = if self.is_exhausted() {
            LoadPhase::Exhausted { pages }
        } else {
            LoadPhase::Loaded { pages }
        };

        debug!(
            page = request.page,
            total_pages = total,
            items = self.item_count(),
            "Catalog page accepted"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_page(page: u32, total_pages: u32, stocks: &[&str]) -> CatalogPage {
        CatalogPage {
            items: stocks
                .iter()
                .map(|s| CatalogItem {
                    stock: s.to_string(),
                    shape: format!("Shape{}", page),
                    image_url: "https://img.example/x.jpg".to_string(),
                    ..Default::default()
                })
                .collect(),
            page,
            limit: 2,
            total: (total_pages * 2) as u64,
            total_pages,
            updated_at: Utc.with_ymd_and_hms(2026, 1, page, 12, 0, 0).unwrap(),
        }
    }

    fn stocks(state: &CatalogState) -> Vec<String> {
        state.items().map(|i| i.stock.clone()).collect()
    }

    #[test]
    fn test_initial_load_requests_page_one() {
        let mut state = CatalogState::new(2);
        assert_eq!(state.phase(), &LoadPhase::Idle);

        let req = state.initial_load().unwrap();
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 2);
        assert_eq!(state.phase(), &LoadPhase::Loading { page: 1 });

        // Second initial load while loading is ignored
        assert!(state.initial_load().is_none());
    }

    #[test]
    fn test_pages_append_in_order_until_exhausted() {
        let mut state = CatalogState::new(2);

        let req = state.initial_load().unwrap();
        assert!(state.complete(req, Ok(make_page(1, 2, &["A", "B"]))).is_none());
        assert_eq!(state.phase(), &LoadPhase::Loaded { pages: 1 });

        let req = state.load_more().unwrap();
        assert_eq!(req.page, 2);
        state.complete(req, Ok(make_page(2, 2, &["C"])));

        assert_eq!(state.phase(), &LoadPhase::Exhausted { pages: 2 });
        assert_eq!(stocks(&state), vec!["A", "B", "C"]);
        assert!(state.load_more().is_none());
        assert!(state.sentinel_visible().is_none());
    }

    #[test]
    fn test_empty_catalog_is_exhausted_after_first_page() {
        let mut state = CatalogState::new(50);
        let req = state.initial_load().unwrap();
        state.complete(req, Ok(make_page(1, 0, &[])));
        assert_eq!(state.phase(), &LoadPhase::Exhausted { pages: 1 });
        assert!(state.load_more().is_none());
    }

    #[test]
    fn test_load_more_blocked_while_in_flight() {
        let mut state = CatalogState::new(2);
        let req = state.initial_load().unwrap();
        state.complete(req, Ok(make_page(1, 3, &["A", "B"])));

        let req = state.load_more().unwrap();
        assert!(state.is_in_flight());
        assert!(state.load_more().is_none());
        assert!(state.sentinel_visible().is_none());
        assert!(state.auto_refresh_tick().is_none());

        state.complete(req, Ok(make_page(2, 3, &["C", "D"])));
        assert_eq!(state.load_more().unwrap().page, 3);
    }

    #[test]
    fn test_failed_page_keeps_earlier_data() {
        let mut state = CatalogState::new(2);
        let req = state.initial_load().unwrap();
        state.complete(req, Ok(make_page(1, 3, &["A", "B"])));

        let req = state.load_more().unwrap();
        state.complete(req, Err(FetchError::Network("connection refused".to_string())));

        assert!(matches!(state.phase(), LoadPhase::Error { page: 2, .. }));
        assert!(state.error_message().unwrap().contains("connection refused"));
        assert_eq!(stocks(&state), vec!["A", "B"]);

        // Retry picks up the failed page
        let req = state.load_more().unwrap();
        assert_eq!(req.page, 2);
        state.complete(req, Ok(make_page(2, 3, &["C", "D"])));
        assert_eq!(state.phase(), &LoadPhase::Loaded { pages: 2 });
    }

    #[test]
    fn test_refresh_revalidates_every_cached_page() {
        let mut state = CatalogState::new(2);
        let req = state.initial_load().unwrap();
        state.complete(req, Ok(make_page(1, 3, &["A", "B"])));
        let req = state.load_more().unwrap();
        state.complete(req, Ok(make_page(2, 3, &["C", "D"])));

        state.set_filter(FilterState {
            query: "a".to_string(),
            ..Default::default()
        });

        let req = state.refresh().unwrap();
        assert_eq!((req.page, req.kind), (1, RequestKind::Revalidate));
        let next = state.complete(req, Ok(make_page(1, 3, &["A2", "B2"]))).unwrap();
        assert_eq!((next.page, next.kind), (2, RequestKind::Revalidate));
        assert!(state.complete(next, Ok(make_page(2, 3, &["C2", "D2"]))).is_none());

        assert_eq!(stocks(&state), vec!["A2", "B2", "C2", "D2"]);
        assert_eq!(state.filter().query, "a");
        assert_eq!(state.phase(), &LoadPhase::Loaded { pages: 2 });
    }

    #[test]
    fn test_refresh_during_fetch_runs_after_it_settles() {
        let mut state = CatalogState::new(2);
        let req = state.initial_load().unwrap();
        state.complete(req, Ok(make_page(1, 3, &["A", "B"])));

        let req = state.load_more().unwrap();
        assert!(state.refresh().is_none());

        let next = state.complete(req, Ok(make_page(2, 3, &["C", "D"]))).unwrap();
        assert_eq!((next.page, next.kind), (1, RequestKind::Revalidate));
    }

    #[test]
    fn test_auto_refresh_tick_coalesced_while_busy() {
        let mut state = CatalogState::new(2);
        let req = state.initial_load().unwrap();
        state.complete(req, Ok(make_page(1, 1, &["A"])));

        let req = state.auto_refresh_tick().unwrap();
        assert_eq!(req.kind, RequestKind::Revalidate);
        // Second tick while the first revalidation is still out
        assert!(state.auto_refresh_tick().is_none());
        assert!(state.complete(req, Ok(make_page(1, 1, &["A"]))).is_none());
        assert_eq!(state.phase(), &LoadPhase::Exhausted { pages: 1 });
    }

    #[test]
    fn test_focus_regained_revalidates() {
        let mut state = CatalogState::new(2);
        // Before the first load there is nothing to revalidate
        assert!(state.focus_regained().is_none());

        let req = state.initial_load().unwrap();
        state.complete(req, Ok(make_page(1, 2, &["A", "B"])));
        let req = state.focus_regained().unwrap();
        assert_eq!((req.page, req.kind), (1, RequestKind::Revalidate));
    }

    #[test]
    fn test_revalidation_failure_keeps_data_and_stops_pass() {
        let mut state = CatalogState::new(2);
        let req = state.initial_load().unwrap();
        state.complete(req, Ok(make_page(1, 2, &["A", "B"])));
        let req = state.load_more().unwrap();
        state.complete(req, Ok(make_page(2, 2, &["C"])));

        let req = state.refresh().unwrap();
        let next = state.complete(
            req,
            Err(FetchError::Status {
                status: 502,
                message: "down".to_string(),
            }),
        );
        assert!(next.is_none());
        assert!(matches!(state.phase(), LoadPhase::Error { page: 1, .. }));
        assert_eq!(stocks(&state), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_load_more_retries_failed_revalidation() {
        let mut state = CatalogState::new(2);
        let req = state.initial_load().unwrap();
        state.complete(req, Ok(make_page(1, 1, &["A", "B"])));
        assert!(state.is_exhausted());

        let req = state.refresh().unwrap();
        state.complete(req, Err(FetchError::Network("timeout".to_string())));
        assert!(matches!(state.phase(), LoadPhase::Error { page: 1, .. }));

        let req = state.load_more().unwrap();
        assert_eq!((req.page, req.kind), (1, RequestKind::Revalidate));
        state.complete(req, Ok(make_page(1, 1, &["A2", "B2"])));
        assert_eq!(stocks(&state), vec!["A2", "B2"]);
        assert_eq!(state.phase(), &LoadPhase::Exhausted { pages: 1 });
    }

    #[test]
    fn test_shrunk_sheet_drops_stale_pages() {
        let mut state = CatalogState::new(2);
        let req = state.initial_load().unwrap();
        state.complete(req, Ok(make_page(1, 3, &["A", "B"])));
        let req = state.load_more().unwrap();
        state.complete(req, Ok(make_page(2, 3, &["C", "D"])));

        let req = state.refresh().unwrap();
        let next = state.complete(req, Ok(make_page(1, 1, &["A"])));
        assert!(next.is_none());
        assert_eq!(stocks(&state), vec!["A"]);
        assert_eq!(state.phase(), &LoadPhase::Exhausted { pages: 1 });
    }

    #[test]
    fn test_refresh_before_any_data_retries_first_page() {
        let mut state = CatalogState::new(2);
        let req = state.initial_load().unwrap();
        state.complete(req, Err(FetchError::Network("offline".to_string())));

        let req = state.refresh().unwrap();
        assert_eq!((req.page, req.kind), (1, RequestKind::Append));
    }

    #[test]
    fn test_filter_options_follow_collection() {
        let mut state = CatalogState::new(2);
        assert_eq!(state.filter_options().shapes, vec!["All"]);

        let req = state.initial_load().unwrap();
        state.complete(req, Ok(make_page(1, 2, &["A", "B"])));
        assert_eq!(state.filter_options().shapes, vec!["All", "Shape1"]);

        let req = state.load_more().unwrap();
        state.complete(req, Ok(make_page(2, 2, &["C"])));
        assert_eq!(state.filter_options().shapes, vec!["All", "Shape1", "Shape2"]);
    }

    #[test]
    fn test_visible_applies_filter() {
        let mut state = CatalogState::new(2);
        let req = state.initial_load().unwrap();
        state.complete(req, Ok(make_page(1, 2, &["A", "B"])));
        let req = state.load_more().unwrap();
        state.complete(req, Ok(make_page(2, 2, &["C"])));

        state.filter_mut().shape = "Shape2".to_string();
        let visible: Vec<_> = state.visible().iter().map(|i| i.stock.clone()).collect();
        assert_eq!(visible, vec!["C"]);
        assert_eq!(state.item_count(), 3);
    }

    #[test]
    fn test_updated_at_comes_from_first_page() {
        let mut state = CatalogState::new(2);
        assert!(state.updated_at().is_none());
        let req = state.initial_load().unwrap();
        state.complete(req, Ok(make_page(1, 2, &["A"])));
        let req = state.load_more().unwrap();
        state.complete(req, Ok(make_page(2, 2, &["B"])));
        assert_eq!(
            state.updated_at(),
            Some(Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_stale_result_ignored() {
        let mut state = CatalogState::new(2);
        let req = state.initial_load().unwrap();
        let bogus = PageRequest {
            page: 7,
            limit: 2,
            kind: RequestKind::Append,
        };
        assert!(state.complete(bogus, Ok(make_page(7, 9, &["Z"]))).is_none());
        assert_eq!(state.item_count(), 0);
        assert!(state.is_in_flight());
        state.complete(req, Ok(make_page(1, 1, &["A"])));
        assert_eq!(stocks(&state), vec!["A"]);
    }
}
