use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fwkit::{
    async_trait, ErrorKind, FwError, FwResult, Page, PageCursor, PageFetcher, Paginator,
};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing_test::traced_test;

/// Serves scripted responses in order and records the cursors it was asked for.
#[derive(Default)]
struct ScriptedFetcher {
    responses: Mutex<VecDeque<FwResult<Page<&'static str>>>>,
    requested: Mutex<Vec<Option<String>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn new(responses: Vec<FwResult<Page<&'static str>>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher<&'static str> for ScriptedFetcher {
    async fn fetch(&self, cursor: Option<&PageCursor>) -> FwResult<Page<&'static str>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested
            .lock()
            .push(cursor.map(|c| c.as_str().to_owned()));
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(FwError::unknown("script exhausted")))
    }
}

fn page(items: &[&'static str], next: Option<&str>) -> FwResult<Page<&'static str>> {
    Ok(Page::new(items.to_vec(), next.map(PageCursor::new)))
}

#[tokio::test]
async fn pages_concatenate_in_order() {
    let fetcher = ScriptedFetcher::new(vec![page(&["A", "B"], Some("1")), page(&["C"], None)]);
    let paginator = Paginator::<&'static str>::from_arc(fetcher.clone());

    paginator.load_first().await.unwrap();
    let result = paginator.load_next().await.unwrap();

    assert_eq!(result.items, vec!["C"]);
    assert_eq!(paginator.items(), vec!["A", "B", "C"]);
    let state = paginator.paging_state();
    assert!(!state.has_more);
    assert_eq!(state.current_page, 1);
    assert_eq!(
        *fetcher.requested.lock(),
        vec![None, Some("1".to_string())]
    );
}

#[tokio::test]
async fn load_next_without_more_pages_fails_fast() {
    let fetcher = ScriptedFetcher::new(vec![page(&["A"], None)]);
    let paginator = Paginator::<&'static str>::from_arc(fetcher.clone());
    paginator.load_first().await.unwrap();

    let err = paginator.load_next().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.message(), "No more pages available");
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn failed_load_next_keeps_items_and_a_later_success_clears_error() {
    let fetcher = ScriptedFetcher::new(vec![
        page(&["A", "B"], Some("1")),
        Err(FwError::server_error("boom", Some(500))),
        page(&["C"], None),
    ]);
    let paginator = Paginator::<&'static str>::from_arc(fetcher);
    paginator.load_first().await.unwrap();

    let err = paginator.load_next().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerError);
    let snapshot = paginator.snapshot();
    assert_eq!(snapshot.items, vec!["A", "B"]);
    assert_eq!(snapshot.paging.current_page, 0);
    assert_eq!(snapshot.paging.error, Some(err));
    assert!(!snapshot.paging.is_loading_more);
    assert!(!paginator.can_load_more());

    paginator.load_next().await.unwrap();
    let snapshot = paginator.snapshot();
    assert_eq!(snapshot.items, vec!["A", "B", "C"]);
    assert_eq!(snapshot.paging.error, None);
}

#[tokio::test]
async fn refresh_replaces_items_and_resets_cursor() {
    let fetcher = ScriptedFetcher::new(vec![
        page(&["A"], Some("1")),
        page(&["B"], Some("2")),
        page(&["X", "Y"], Some("1")),
    ]);
    let paginator = Paginator::<&'static str>::from_arc(fetcher.clone());
    paginator.load_first().await.unwrap();
    paginator.load_next().await.unwrap();

    paginator.refresh().await.unwrap();

    assert_eq!(paginator.items(), vec!["X", "Y"]);
    assert_eq!(paginator.paging_state().current_page, 0);
    assert!(!paginator.is_refreshing());
    assert_eq!(fetcher.requested.lock()[2], None);
}

#[tokio::test]
async fn reported_totals_are_published() {
    let fetcher = ScriptedFetcher::new(vec![Ok(
        Page::new(vec!["A"], Some(PageCursor::from_page_number(1))).with_totals(40, 40),
    )]);
    let paginator = Paginator::<&'static str>::from_arc(fetcher);
    let result = paginator.load_first().await.unwrap();
    assert_eq!(result.total_elements, 40);
    assert_eq!(paginator.paging_state().total_pages, Some(40));
}

/// Blocks every fetch until released.
struct GatedFetcher {
    release: Notify,
    calls: AtomicUsize,
}

#[async_trait]
impl PageFetcher<u32> for GatedFetcher {
    async fn fetch(&self, _cursor: Option<&PageCursor>) -> FwResult<Page<u32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        Ok(Page::new(vec![1, 2], Some(PageCursor::from_page_number(1))))
    }
}

#[tokio::test]
async fn concurrent_load_next_is_rejected_without_a_call() {
    let fetcher = Arc::new(GatedFetcher {
        release: Notify::new(),
        calls: AtomicUsize::new(0),
    });
    let paginator = Arc::new(Paginator::<u32>::from_arc(fetcher.clone()));

    let first = tokio::spawn({
        let paginator = paginator.clone();
        async move { paginator.load_next().await }
    });
    while fetcher.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    assert!(paginator.paging_state().is_loading_more);

    let err = paginator.load_next().await.unwrap_err();
    assert_eq!(err.message(), "Already loading");
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

    fetcher.release.notify_one();
    first.await.unwrap().unwrap();
    assert_eq!(paginator.items(), vec![1, 2]);
}

#[tokio::test]
async fn second_refresh_fails_fast() {
    let fetcher = Arc::new(GatedFetcher {
        release: Notify::new(),
        calls: AtomicUsize::new(0),
    });
    let paginator = Arc::new(Paginator::<u32>::from_arc(fetcher.clone()));
    let mut refreshing = paginator.subscribe_refreshing();

    let first = tokio::spawn({
        let paginator = paginator.clone();
        async move { paginator.refresh().await }
    });
    refreshing.wait_for(|r| *r).await.unwrap();

    let err = paginator.refresh().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    fetcher.release.notify_one();
    first.await.unwrap().unwrap();
    assert!(!paginator.is_refreshing());
}

#[tokio::test]
async fn cancelled_load_clears_flags_and_keeps_items() {
    let fetcher = Arc::new(GatedFetcher {
        release: Notify::new(),
        calls: AtomicUsize::new(0),
    });
    let paginator = Paginator::<u32>::from_arc(fetcher);
    paginator.add_item_at_end(7);

    let outcome = tokio::time::timeout(Duration::from_millis(20), paginator.load_first()).await;
    assert!(outcome.is_err());

    let snapshot = paginator.snapshot();
    assert_eq!(snapshot.items, vec![7]);
    assert!(!snapshot.paging.is_loading);
    assert!(!snapshot.paging.is_loading_more);
}

#[tokio::test]
async fn observers_never_see_items_without_matching_state() {
    let fetcher = ScriptedFetcher::new(vec![page(&["A", "B"], Some("1")), page(&["C"], None)]);
    let paginator = Paginator::<&'static str>::from_arc(fetcher);
    let mut rx = paginator.subscribe();

    paginator.load_first().await.unwrap();
    rx.mark_changed();
    let seen = rx.borrow_and_update().clone();
    assert_eq!(seen.items.len() as u64, seen.paging.total_elements);
    assert!(!seen.paging.is_loading);
}

#[tokio::test]
#[traced_test]
async fn failures_are_logged_with_error_code() {
    let fetcher = ScriptedFetcher::new(vec![Err(FwError::timeout())]);
    let paginator = Paginator::<&'static str>::from_arc(fetcher);
    let _ = paginator.load_first().await;
    assert!(logs_contain("page load failed"));
    assert!(logs_contain("TIMEOUT"));
}
