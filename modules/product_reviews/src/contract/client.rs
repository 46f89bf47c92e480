use async_trait::async_trait;
use fwkit::{FwResult, Page, PageRequest};

use crate::contract::model::{
    ChatResponse, GlobalStats, NewNotification, NewReview, Notification, Product, ProductQuery,
    Review,
};

/// Backend surface used by the domain services.
///
/// Implementations normalize every failure into [`fwkit::FwError`].
#[async_trait]
pub trait ReviewApi: Send + Sync {
    /// `GET /api/products`
    async fn list_products(&self, query: &ProductQuery, page: PageRequest) -> FwResult<Page<Product>>;

    /// `GET /api/products/{id}`
    async fn get_product(&self, id: u64) -> FwResult<Product>;

    /// `GET /api/products/stats`
    async fn global_stats(&self, category: Option<&str>, search: Option<&str>) -> FwResult<GlobalStats>;

    /// `GET /api/products/{id}/reviews`
    async fn list_reviews(
        &self,
        product_id: u64,
        rating: Option<u8>,
        page: PageRequest,
    ) -> FwResult<Page<Review>>;

    /// `POST /api/products/{id}/reviews`
    async fn post_review(&self, product_id: u64, review: &NewReview) -> FwResult<Review>;

    /// `PUT /api/products/reviews/{id}/helpful`; toggles the caller's vote.
    async fn toggle_helpful(&self, review_id: u64) -> FwResult<Review>;

    /// `GET /api/products/reviews/voted`
    async fn voted_reviews(&self) -> FwResult<Vec<u64>>;

    /// `POST /api/products/{id}/chat`
    async fn chat(&self, product_id: u64, question: &str) -> FwResult<ChatResponse>;

    /// `GET /api/user/wishlist`
    async fn wishlist_ids(&self) -> FwResult<Vec<u64>>;

    /// `GET /api/user/wishlist/products`
    async fn wishlist_products(&self, page: PageRequest) -> FwResult<Page<Product>>;

    /// `POST /api/user/wishlist/{id}`; toggles membership.
    async fn toggle_wishlist(&self, product_id: u64) -> FwResult<()>;

    /// `GET /api/user/notifications`
    async fn notifications(&self) -> FwResult<Vec<Notification>>;

    /// `GET /api/user/notifications/unread-count`
    async fn unread_count(&self) -> FwResult<u64>;

    /// `PUT /api/user/notifications/{id}/read`
    async fn mark_notification_read(&self, id: u64) -> FwResult<()>;

    /// `PUT /api/user/notifications/read-all`
    async fn mark_all_notifications_read(&self) -> FwResult<()>;

    /// `POST /api/user/notifications`
    async fn create_notification(&self, notification: &NewNotification) -> FwResult<()>;

    /// `DELETE /api/user/notifications/{id}`
    async fn delete_notification(&self, id: u64) -> FwResult<()>;

    /// `DELETE /api/user/notifications`
    async fn delete_all_notifications(&self) -> FwResult<()>;
}
