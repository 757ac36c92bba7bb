//! Async driver for [`CatalogState`]
//!
//! Owns the state machine and a [`PageSource`], performs the fetches the
//! machine asks for, and runs the background revalidation timer.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::filter::FilterState;
use crate::source::PageSource;
use crate::state::{CatalogState, LoadPhase, PageRequest};

/// User-facing triggers delivered to [`BrowseSession::run`]
#[derive(Debug, Clone, PartialEq)]
pub enum BrowseCommand {
    /// "Load more" button
    LoadMore,
    /// Sentinel near the end of the list scrolled into view
    SentinelVisible,
    /// Manual refresh
    Refresh,
    /// Window regained focus
    FocusRegained,
    /// Replace search/filter/sort
    SetFilter(FilterState),
}

pub struct BrowseSession<S> {
    source: S,
    state: CatalogState,
    refresh_interval: Duration,
}

impl<S: PageSource> BrowseSession<S> {
    pub fn new(source: S, page_size: u32, refresh_interval: Duration) -> Self {
        Self {
            source,
            state: CatalogState::new(page_size),
            refresh_interval,
        }
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    pub fn into_state(self) -> CatalogState {
        self.state
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        self.state.set_filter(filter);
    }

    pub async fn initial_load(&mut self) {
        let request = self.state.initial_load();
        self.drive(request).await;
    }

    pub async fn load_more(&mut self) {
        let request = self.state.load_more();
        self.drive(request).await;
    }

    pub async fn sentinel_visible(&mut self) {
        let request = self.state.sentinel_visible();
        self.drive(request).await;
    }

    pub async fn refresh(&mut self) {
        let request = self.state.refresh();
        self.drive(request).await;
    }

    pub async fn auto_refresh_tick(&mut self) {
        let request = self.state.auto_refresh_tick();
        self.drive(request).await;
    }

    pub async fn focus_regained(&mut self) {
        let request = self.state.focus_regained();
        self.drive(request).await;
    }

    /// Keep loading pages until exhausted or a fetch fails
    pub async fn load_all(&mut self) {
        if self.state.phase() == &LoadPhase::Idle {
            self.initial_load().await;
        }
        while let Some(request) = self.state.load_more() {
            self.drive(Some(request)).await;
            if matches!(self.state.phase(), LoadPhase::Error { .. }) {
                break;
            }
        }
    }

    /// Load up to `pages` pages in total, stopping early on error or exhaustion
    pub async fn load_pages(&mut self, pages: u32) {
        if self.state.phase() == &LoadPhase::Idle {
            self.initial_load().await;
        }
        while self.state.loaded_pages() < pages {
            let Some(request) = self.state.load_more() else {
                break;
            };
            self.drive(Some(request)).await;
            if matches!(self.state.phase(), LoadPhase::Error { .. }) {
                break;
            }
        }
    }

    /// Perform `first` and every follow-up fetch the state machine queues
    async fn drive(&mut self, first: Option<PageRequest>) {
        let mut next = first;
        while let Some(request) = next {
            let result = self.source.fetch_page(request.page, request.limit).await;
            next = self.state.complete(request, result);
        }
    }

    /// Event loop: initial load, then commands and timer ticks
    ///
    /// `on_change` is called after every transition that settled. Returns the
    /// final state once the command channel closes.
    pub async fn run<F>(
        mut self,
        mut commands: mpsc::Receiver<BrowseCommand>,
        mut on_change: F,
    ) -> CatalogState
    where
        F: FnMut(&CatalogState),
    {
        info!(
            "Starting browse session (page size: {}, refresh every {}ms)",
            self.state.page_size(),
            self.refresh_interval.as_millis()
        );

        self.initial_load().await;
        on_change(&self.state);

        let mut timer = interval_at(Instant::now() + self.refresh_interval, self.refresh_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("Command channel closed, stopping browse session");
                        break;
                    };
                    match command {
                        BrowseCommand::LoadMore => self.load_more().await,
                        BrowseCommand::SentinelVisible => self.sentinel_visible().await,
                        BrowseCommand::Refresh => self.refresh().await,
                        BrowseCommand::FocusRegained => self.focus_regained().await,
                        BrowseCommand::SetFilter(filter) => self.set_filter(filter),
                    }
                    on_change(&self.state);
                }
                _ = timer.tick() => {
                    debug!("Auto-refresh tick");
                    self.auto_refresh_tick().await;
                    on_change(&self.state);
                }
            }
        }

        self.state
    }
}
