use std::sync::Arc;

use paging_core::{Page, PageCursor};
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use super::fetcher::PageFetcher;
use super::refresh::RefreshController;
use super::state::{PagingResult, PagingState};
use crate::error::{FwError, FwResult};

/// Items and paging state, always published together.
#[derive(Clone, Debug, PartialEq)]
pub struct ListSnapshot<T> {
    pub items: Vec<T>,
    pub paging: PagingState,
}

impl<T> Default for ListSnapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            paging: PagingState::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoadMode {
    Replace,
    Append,
}

/// Concatenating paginator over a [`PageFetcher`].
///
/// The cursor lives inside an async mutex: holding the lock is what "a load
/// is in progress" means. `load_first`/`refresh` queue behind an in-flight
/// load; `load_next` refuses to.
pub struct Paginator<T> {
    fetcher: Arc<dyn PageFetcher<T>>,
    state: watch::Sender<ListSnapshot<T>>,
    cursor: Mutex<Option<PageCursor>>,
    refresh: RefreshController,
}

impl<T> Paginator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(fetcher: impl PageFetcher<T> + 'static) -> Self {
        Self::from_arc(Arc::new(fetcher))
    }

    pub fn from_arc(fetcher: Arc<dyn PageFetcher<T>>) -> Self {
        let (state, _rx) = watch::channel(ListSnapshot::default());
        Self {
            fetcher,
            state,
            cursor: Mutex::new(None),
            refresh: RefreshController::new(),
        }
    }

    /// Fetch page 0 and replace the list.
    pub async fn load_first(&self) -> FwResult<PagingResult<T>> {
        let mut cursor = self.cursor.lock().await;
        self.load(&mut cursor, LoadMode::Replace).await
    }

    /// Fetch the page after the stored cursor and append it.
    pub async fn load_next(&self) -> FwResult<PagingResult<T>> {
        let Ok(mut cursor) = self.cursor.try_lock() else {
            debug!("load_next rejected: a load is already in progress");
            return Err(FwError::invalid_argument("Already loading"));
        };
        if !self.state.borrow().paging.has_more {
            return Err(FwError::invalid_argument("No more pages available"));
        }
        self.load(&mut cursor, LoadMode::Append).await
    }

    /// Same as [`Paginator::load_first`] with the refreshing flag raised.
    pub async fn refresh(&self) -> FwResult<PagingResult<T>> {
        let Some(_refreshing) = self.refresh.try_begin() else {
            return Err(FwError::invalid_argument("Already refreshing"));
        };
        let mut cursor = self.cursor.lock().await;
        self.load(&mut cursor, LoadMode::Replace).await
    }

    /// Drop all items and the cursor, back to the initial state.
    pub async fn reset(&self) {
        let mut cursor = self.cursor.lock().await;
        *cursor = None;
        self.state.send_replace(ListSnapshot::default());
    }

    async fn load(
        &self,
        cursor: &mut Option<PageCursor>,
        mode: LoadMode,
    ) -> FwResult<PagingResult<T>> {
        let requested = match mode {
            LoadMode::Replace => None,
            LoadMode::Append => cursor.clone(),
        };
        let page_number = requested.as_ref().map_or(0, PageCursor::to_page_number);
        debug!(page = page_number, ?mode, "loading page");

        self.state.send_modify(|s| match mode {
            LoadMode::Replace => s.paging.is_loading = true,
            LoadMode::Append => s.paging.is_loading_more = true,
        });
        let busy = BusyFlags::new(&self.state);
        let outcome = self.fetcher.fetch(requested.as_ref()).await;
        busy.disarm();

        match outcome {
            Ok(page) => Ok(self.publish_page(cursor, page, page_number, mode)),
            Err(err) => {
                warn!(page = page_number, error_code = err.code(), error = %err, "page load failed");
                let stored = err.clone();
                self.state.send_modify(|s| {
                    s.paging.is_loading = false;
                    s.paging.is_loading_more = false;
                    s.paging.error = Some(stored);
                });
                Err(err)
            }
        }
    }

    fn publish_page(
        &self,
        cursor: &mut Option<PageCursor>,
        page: Page<T>,
        page_number: u32,
        mode: LoadMode,
    ) -> PagingResult<T> {
        let has_more = page.has_more();
        let Page {
            items,
            next_cursor,
            total_elements,
            total_pages,
        } = page;
        let fetched = items.clone();
        *cursor = next_cursor;

        let mut published_total = 0;
        self.state.send_modify(|s| {
            match mode {
                LoadMode::Replace => s.items = items,
                LoadMode::Append => s.items.extend(items),
            }
            published_total = total_elements.unwrap_or(s.items.len() as u64);
            s.paging = PagingState {
                is_loading: false,
                is_loading_more: false,
                has_more,
                current_page: page_number,
                total_pages,
                total_elements: published_total,
                error: None,
            };
        });
        debug!(page = page_number, fetched = fetched.len(), has_more, "page loaded");

        PagingResult {
            items: fetched,
            has_more,
            current_page: page_number,
            total_pages,
            total_elements: published_total,
        }
    }

    pub fn add_item_at_start(&self, item: T) {
        self.state.send_modify(|s| {
            s.items.insert(0, item);
            s.paging.total_elements += 1;
        });
    }

    pub fn add_item_at_end(&self, item: T) {
        self.state.send_modify(|s| {
            s.items.push(item);
            s.paging.total_elements += 1;
        });
    }

    /// Apply `f` to every item matching `pred`; returns how many changed.
    pub fn update_item(&self, pred: impl Fn(&T) -> bool, f: impl Fn(&mut T)) -> usize {
        let mut changed = 0;
        self.state.send_if_modified(|s| {
            for item in s.items.iter_mut().filter(|i| pred(i)) {
                f(item);
                changed += 1;
            }
            changed > 0
        });
        changed
    }

    pub fn remove_items(&self, pred: impl Fn(&T) -> bool) -> usize {
        let mut removed = 0;
        self.state.send_if_modified(|s| {
            let before = s.items.len();
            s.items.retain(|i| !pred(i));
            removed = before - s.items.len();
            s.paging.total_elements = s.paging.total_elements.saturating_sub(removed as u64);
            removed > 0
        });
        removed
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<T>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.state.borrow().items.clone()
    }

    pub fn paging_state(&self) -> PagingState {
        self.state.borrow().paging.clone()
    }

    pub fn can_load_more(&self) -> bool {
        self.state.borrow().paging.can_load_more()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_refreshing()
    }

    pub fn subscribe_refreshing(&self) -> watch::Receiver<bool> {
        self.refresh.subscribe()
    }
}

/// Clears the loading flags if the load future is dropped mid-fetch.
struct BusyFlags<'a, T> {
    state: Option<&'a watch::Sender<ListSnapshot<T>>>,
}

impl<'a, T> BusyFlags<'a, T> {
    fn new(state: &'a watch::Sender<ListSnapshot<T>>) -> Self {
        Self { state: Some(state) }
    }

    fn disarm(mut self) {
        self.state = None;
    }
}

impl<T> Drop for BusyFlags<'_, T> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            debug!("page load cancelled");
            state.send_modify(|s| {
                s.paging.is_loading = false;
                s.paging.is_loading_more = false;
            });
        }
    }
}
