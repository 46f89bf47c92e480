#![allow(dead_code)]

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use fwkit::{FwError, FwResult, Page, PageCursor, PageRequest};
use parking_lot::Mutex;

use product_reviews::contract::client::ReviewApi;
use product_reviews::contract::model::*;
use product_reviews::domain::preferences::Preferences;
use product_reviews::infra::MemoryPreferenceStore;

/// In-memory backend that records every call by name.
#[derive(Default)]
pub struct FakeBackend {
    pub products: Vec<Product>,
    pub reviews: Mutex<Vec<Review>>,
    pub voted: Mutex<HashSet<u64>>,
    pub wishlist: Mutex<BTreeSet<u64>>,
    pub notifications: Mutex<Vec<Notification>>,
    /// Wishlist toggles for these ids fail with a server error.
    pub failing_products: Mutex<HashSet<u64>>,
    /// The wishlist toggle call with this 1-based index fails.
    pub failing_toggle_call: Mutex<Option<usize>>,
    /// When set, every call fails with this error.
    pub outage: Mutex<Option<FwError>>,
    pub calls: Mutex<Vec<String>>,
    next_id: AtomicU64,
}

pub fn product(id: u64) -> Product {
    Product {
        id,
        name: format!("Product {id}"),
        description: None,
        categories: vec!["Audio".to_string()],
        price: 10.0 * id as f64,
        average_rating: Some(4.0),
        review_count: Some(2),
        rating_breakdown: None,
        image_url: None,
        ai_summary: None,
    }
}

pub fn review(id: u64, helpful: u64) -> Review {
    Review {
        id: Some(id),
        reviewer_name: Some("Sam".to_string()),
        rating: 4,
        comment: format!("review {id}"),
        helpful_count: helpful,
        created_at: Some("2024-05-01T10:00:00".to_string()),
    }
}

pub fn notification(id: u64, read: bool) -> Notification {
    Notification {
        id: NotificationId::Server(id),
        title: format!("title {id}"),
        message: format!("message {id}"),
        is_read: read,
        created_at: "2024-05-01T10:00:00".to_string(),
        product_id: None,
        kind: NotificationKind::System,
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1000),
            ..Self::default()
        }
    }

    pub fn with_products(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.products = ids.into_iter().map(product).collect();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count_calls(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.starts_with(name)).count()
    }

    pub fn fail_product(&self, id: u64) {
        self.failing_products.lock().insert(id);
    }

    pub fn fail_nth_toggle(&self, n: usize) {
        *self.failing_toggle_call.lock() = Some(n);
    }

    pub fn go_down(&self, err: FwError) {
        *self.outage.lock() = Some(err);
    }

    fn record(&self, call: String) -> FwResult<()> {
        self.calls.lock().push(call);
        match self.outage.lock().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn paged<T: Clone>(all: &[T], page: &PageRequest) -> Page<T> {
        let start = (page.page * page.size) as usize;
        let items: Vec<T> = all.iter().skip(start).take(page.size as usize).cloned().collect();
        let more = start + items.len() < all.len();
        Page::new(items, more.then(|| PageCursor::from_page_number(page.page + 1)))
            .with_totals(all.len() as u64, all.len().div_ceil(page.size.max(1) as usize) as u64)
    }
}

#[async_trait]
impl ReviewApi for FakeBackend {
    async fn list_products(&self, query: &ProductQuery, page: PageRequest) -> FwResult<Page<Product>> {
        self.record(format!("list_products:{}", page.page))?;
        let filtered: Vec<Product> = self
            .products
            .iter()
            .filter(|p| match &query.category {
                Some(c) => p.categories.contains(c),
                None => true,
            })
            .cloned()
            .collect();
        Ok(Self::paged(&filtered, &page))
    }

    async fn get_product(&self, id: u64) -> FwResult<Product> {
        self.record(format!("get_product:{id}"))?;
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| FwError::not_found("Product not found"))
    }

    async fn global_stats(&self, _category: Option<&str>, _search: Option<&str>) -> FwResult<GlobalStats> {
        self.record("global_stats".into())?;
        Ok(GlobalStats {
            total_products: self.products.len() as u64,
            total_reviews: self.reviews.lock().len() as u64,
            average_rating: 4.0,
        })
    }

    async fn list_reviews(&self, product_id: u64, rating: Option<u8>, page: PageRequest) -> FwResult<Page<Review>> {
        self.record(format!("list_reviews:{product_id}:{}:{rating:?}", page.page))?;
        let filtered: Vec<Review> = self
            .reviews
            .lock()
            .iter()
            .filter(|r| rating.map_or(true, |want| r.rating == want))
            .cloned()
            .collect();
        Ok(Self::paged(&filtered, &page))
    }

    async fn post_review(&self, product_id: u64, review: &NewReview) -> FwResult<Review> {
        self.record(format!("post_review:{product_id}"))?;
        let created = Review {
            id: Some(self.next_id.fetch_add(1, Ordering::SeqCst)),
            reviewer_name: review.reviewer_name.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            helpful_count: 0,
            created_at: Some("2024-05-02T08:00:00".to_string()),
        };
        self.reviews.lock().insert(0, created.clone());
        Ok(created)
    }

    async fn toggle_helpful(&self, review_id: u64) -> FwResult<Review> {
        self.record(format!("toggle_helpful:{review_id}"))?;
        let mut voted = self.voted.lock();
        let mut reviews = self.reviews.lock();
        let review = reviews
            .iter_mut()
            .find(|r| r.id == Some(review_id))
            .ok_or_else(|| FwError::not_found("Review not found"))?;
        if voted.remove(&review_id) {
            review.helpful_count = review.helpful_count.saturating_sub(1);
        } else {
            voted.insert(review_id);
            review.helpful_count += 1;
        }
        Ok(review.clone())
    }

    async fn voted_reviews(&self) -> FwResult<Vec<u64>> {
        self.record("voted_reviews".into())?;
        Ok(self.voted.lock().iter().copied().collect())
    }

    async fn chat(&self, product_id: u64, question: &str) -> FwResult<ChatResponse> {
        self.record(format!("chat:{product_id}"))?;
        Ok(ChatResponse {
            answer: format!("About {question}"),
        })
    }

    async fn wishlist_ids(&self) -> FwResult<Vec<u64>> {
        self.record("wishlist_ids".into())?;
        Ok(self.wishlist.lock().iter().copied().collect())
    }

    async fn wishlist_products(&self, page: PageRequest) -> FwResult<Page<Product>> {
        self.record(format!("wishlist_products:{}", page.page))?;
        let ids = self.wishlist.lock().clone();
        let items: Vec<Product> = self.products.iter().filter(|p| ids.contains(&p.id)).cloned().collect();
        Ok(Self::paged(&items, &page))
    }

    async fn toggle_wishlist(&self, product_id: u64) -> FwResult<()> {
        self.record(format!("toggle_wishlist:{product_id}"))?;
        let nth = self.count_calls("toggle_wishlist");
        if self.failing_products.lock().contains(&product_id) || *self.failing_toggle_call.lock() == Some(nth) {
            return Err(FwError::server_error("Internal error", Some(500)));
        }
        let mut wishlist = self.wishlist.lock();
        if !wishlist.remove(&product_id) {
            wishlist.insert(product_id);
        }
        Ok(())
    }

    async fn notifications(&self) -> FwResult<Vec<Notification>> {
        self.record("notifications".into())?;
        Ok(self.notifications.lock().clone())
    }

    async fn unread_count(&self) -> FwResult<u64> {
        self.record("unread_count".into())?;
        Ok(self.notifications.lock().iter().filter(|n| !n.is_read).count() as u64)
    }

    async fn mark_notification_read(&self, id: u64) -> FwResult<()> {
        self.record(format!("mark_notification_read:{id}"))?;
        for n in self.notifications.lock().iter_mut() {
            if n.id == NotificationId::Server(id) {
                n.is_read = true;
            }
        }
        Ok(())
    }

    async fn mark_all_notifications_read(&self) -> FwResult<()> {
        self.record("mark_all_notifications_read".into())?;
        self.notifications.lock().iter_mut().for_each(|n| n.is_read = true);
        Ok(())
    }

    async fn create_notification(&self, notification: &NewNotification) -> FwResult<()> {
        self.record("create_notification".into())?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.notifications.lock().insert(
            0,
            Notification {
                id: NotificationId::Server(id),
                title: notification.title.clone(),
                message: notification.message.clone(),
                is_read: false,
                created_at: "2024-05-02T08:00:00".to_string(),
                product_id: notification.product_id,
                kind: NotificationKind::System,
            },
        );
        Ok(())
    }

    async fn delete_notification(&self, id: u64) -> FwResult<()> {
        self.record(format!("delete_notification:{id}"))?;
        self.notifications.lock().retain(|n| n.id != NotificationId::Server(id));
        Ok(())
    }

    async fn delete_all_notifications(&self) -> FwResult<()> {
        self.record("delete_all_notifications".into())?;
        self.notifications.lock().clear();
        Ok(())
    }
}

pub fn memory_prefs() -> (Arc<MemoryPreferenceStore>, Arc<Preferences>) {
    let store = Arc::new(MemoryPreferenceStore::default());
    let prefs = Arc::new(Preferences::open(store.clone(), 10).expect("memory prefs"));
    (store, prefs)
}
