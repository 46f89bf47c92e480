//! Paginated list state.
//!
//! A [`Paginator`] owns the concatenated item list, the next-page cursor and
//! the loading flags, and publishes all three together through a
//! `tokio::sync::watch` channel so observers never see a torn update.

mod fetcher;
mod paginator;
mod refresh;
mod state;

pub use fetcher::{fetcher_fn, FnFetcher, PageFetcher};
pub use paginator::{ListSnapshot, Paginator};
pub use refresh::{RefreshController, RefreshGuard};
pub use state::{PagingResult, PagingState};
