//! # fwkit - client-side state toolkit
//!
//! Building blocks shared by every screen-level service:
//!
//! - **error**: the closed error taxonomy produced at the network boundary
//! - **retry**: exponential-backoff policy for idempotent calls
//! - **http**: traced `reqwest` wrapper
//! - **paging**: paginated list state with single atomic publishes
//! - **optimistic**: snapshot-and-apply mutations with rollback

pub use async_trait::async_trait;

pub mod error;
pub mod http;
pub mod optimistic;
pub mod paging;
pub mod retry;

pub use error::{ErrorKind, FwError, FwResult};
pub use http::client::TracedClient;
pub use optimistic::{OptimisticCell, Transaction};
pub use paging::{
    fetcher_fn, FnFetcher, ListSnapshot, PageFetcher, Paginator, PagingResult, PagingState,
    RefreshController, RefreshGuard,
};
pub use paging_core::{Page, PageCursor, PageRequest, SpringPage};
pub use retry::RetryPolicy;
