use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use paging_core::{Page, PageCursor};

use crate::error::FwResult;

/// Source of pages for a [`Paginator`](super::Paginator).
///
/// `None` asks for the first page.
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
    async fn fetch(&self, cursor: Option<&PageCursor>) -> FwResult<Page<T>>;
}

/// [`PageFetcher`] backed by a closure; see [`fetcher_fn`].
pub struct FnFetcher<F, T> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

/// Adapt `Fn(Option<PageCursor>) -> impl Future<Output = FwResult<Page<T>>>` into a fetcher.
pub fn fetcher_fn<T, F, Fut>(f: F) -> FnFetcher<F, T>
where
    F: Fn(Option<PageCursor>) -> Fut + Send + Sync,
    Fut: Future<Output = FwResult<Page<T>>> + Send,
{
    FnFetcher {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<T, F, Fut> PageFetcher<T> for FnFetcher<F, T>
where
    T: Send,
    F: Fn(Option<PageCursor>) -> Fut + Send + Sync,
    Fut: Future<Output = FwResult<Page<T>>> + Send,
{
    async fn fetch(&self, cursor: Option<&PageCursor>) -> FwResult<Page<T>> {
        (self.f)(cursor.cloned()).await
    }
}
