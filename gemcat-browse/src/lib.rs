//! gemcat-browse library
//!
//! Client side of the GemCat inventory browser: pages are pulled from the
//! catalog API into an accumulating collection, then searched, filtered and
//! sorted locally.
//!
//! - [`state`]: pagination state machine (no I/O)
//! - [`session`]: async driver with background revalidation
//! - [`filter`]: search, categorical filters, sort
//! - [`source`]: catalog API client
//! - [`view`]: text rendering

pub mod filter;
pub mod session;
pub mod source;
pub mod state;
pub mod view;

pub use filter::{FilterOptions, FilterState, SortOrder};
pub use session::{BrowseCommand, BrowseSession};
pub use source::{FetchError, HttpPageSource, PageSource};
pub use state::{CatalogState, LoadPhase, PageRequest, RequestKind};
