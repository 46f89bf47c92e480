use async_trait::async_trait;
use fwkit::{FwError, FwResult, Page, PageRequest, RetryPolicy, SpringPage, TracedClient};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::contract::client::ReviewApi;
use crate::contract::model::{
    ChatRequest, ChatResponse, GlobalStats, NewNotification, NewReview, Notification, Product,
    ProductQuery, Review, UnreadCount,
};

/// HTTP adapter implementing [`ReviewApi`] against the backend REST API.
///
/// GET requests are retried according to `retry`; mutating requests are sent once.
pub struct HttpReviewApi {
    client: TracedClient,
    base: Url,
    retry: RetryPolicy,
}

type Query = Vec<(&'static str, String)>;

impl HttpReviewApi {
    pub fn new(client: TracedClient, base: Url, retry: RetryPolicy) -> Self {
        Self {
            client,
            base,
            retry,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, segments: &[&str]) -> FwResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FwError::invalid_argument(format!("invalid base URL: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> FwResult<reqwest::Response> {
        let response = self.client.send(builder).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body_len = body.len(), "backend returned an error");
        Err(FwError::from_response_body(status.as_u16(), &body))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> FwResult<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str], query: Query) -> FwResult<T> {
        let url = self.url(segments)?;
        self.retry
            .execute(|| async {
                let response = self
                    .send(self.client.request(Method::GET, url.as_str()).query(&query))
                    .await?;
                Self::decode(response).await
            })
            .await
    }

    async fn send_json<B, T>(&self, method: Method, segments: &[&str], body: Option<&B>) -> FwResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self.send_raw(method, segments, body).await?;
        Self::decode(response).await
    }

    async fn send_raw<B>(&self, method: Method, segments: &[&str], body: Option<&B>) -> FwResult<reqwest::Response>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(segments)?;
        let mut builder = self.client.request(method, url.as_str());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder).await
    }

    async fn send_empty(&self, method: Method, segments: &[&str]) -> FwResult<()> {
        self.send_raw::<()>(method, segments, None).await?;
        Ok(())
    }
}

fn page_query(page: &PageRequest) -> Query {
    page.query_pairs()
}

fn push_opt(query: &mut Query, key: &'static str, value: Option<impl ToString>) {
    if let Some(v) = value {
        query.push((key, v.to_string()));
    }
}

#[async_trait]
impl ReviewApi for HttpReviewApi {
    #[instrument(name = "product_reviews.http.list_products", skip_all, fields(page = page.page, size = page.size))]
    async fn list_products(&self, query: &ProductQuery, page: PageRequest) -> FwResult<Page<Product>> {
        let mut q = page_query(&page);
        push_opt(&mut q, "category", query.category.as_deref());
        push_opt(&mut q, "search", query.search.as_deref());
        let envelope: SpringPage<Product> = self.get_json(&["api", "products"], q).await?;
        Ok(envelope.into_page())
    }

    #[instrument(name = "product_reviews.http.get_product", skip(self))]
    async fn get_product(&self, id: u64) -> FwResult<Product> {
        self.get_json(&["api", "products", &id.to_string()], Vec::new()).await
    }

    #[instrument(name = "product_reviews.http.global_stats", skip(self))]
    async fn global_stats(&self, category: Option<&str>, search: Option<&str>) -> FwResult<GlobalStats> {
        let mut q = Vec::new();
        push_opt(&mut q, "category", category);
        push_opt(&mut q, "search", search);
        self.get_json(&["api", "products", "stats"], q).await
    }

    #[instrument(name = "product_reviews.http.list_reviews", skip(self, page), fields(page = page.page, size = page.size))]
    async fn list_reviews(
        &self,
        product_id: u64,
        rating: Option<u8>,
        page: PageRequest,
    ) -> FwResult<Page<Review>> {
        let mut q = page_query(&page);
        push_opt(&mut q, "rating", rating);
        let envelope: SpringPage<Review> = self
            .get_json(&["api", "products", &product_id.to_string(), "reviews"], q)
            .await?;
        Ok(envelope.into_page())
    }

    #[instrument(name = "product_reviews.http.post_review", skip(self, review))]
    async fn post_review(&self, product_id: u64, review: &NewReview) -> FwResult<Review> {
        self.send_json(
            Method::POST,
            &["api", "products", &product_id.to_string(), "reviews"],
            Some(review),
        )
        .await
    }

    #[instrument(name = "product_reviews.http.toggle_helpful", skip(self))]
    async fn toggle_helpful(&self, review_id: u64) -> FwResult<Review> {
        self.send_json::<(), _>(
            Method::PUT,
            &["api", "products", "reviews", &review_id.to_string(), "helpful"],
            None,
        )
        .await
    }

    #[instrument(name = "product_reviews.http.voted_reviews", skip(self))]
    async fn voted_reviews(&self) -> FwResult<Vec<u64>> {
        self.get_json(&["api", "products", "reviews", "voted"], Vec::new()).await
    }

    #[instrument(name = "product_reviews.http.chat", skip(self, question))]
    async fn chat(&self, product_id: u64, question: &str) -> FwResult<ChatResponse> {
        let body = ChatRequest {
            question: question.to_string(),
        };
        self.send_json(
            Method::POST,
            &["api", "products", &product_id.to_string(), "chat"],
            Some(&body),
        )
        .await
    }

    #[instrument(name = "product_reviews.http.wishlist_ids", skip(self))]
    async fn wishlist_ids(&self) -> FwResult<Vec<u64>> {
        self.get_json(&["api", "user", "wishlist"], Vec::new()).await
    }

    #[instrument(name = "product_reviews.http.wishlist_products", skip_all, fields(page = page.page, size = page.size))]
    async fn wishlist_products(&self, page: PageRequest) -> FwResult<Page<Product>> {
        let envelope: SpringPage<Product> = self
            .get_json(&["api", "user", "wishlist", "products"], page_query(&page))
            .await?;
        Ok(envelope.into_page())
    }

    #[instrument(name = "product_reviews.http.toggle_wishlist", skip(self))]
    async fn toggle_wishlist(&self, product_id: u64) -> FwResult<()> {
        self.send_empty(Method::POST, &["api", "user", "wishlist", &product_id.to_string()])
            .await
    }

    #[instrument(name = "product_reviews.http.notifications", skip(self))]
    async fn notifications(&self) -> FwResult<Vec<Notification>> {
        self.get_json(&["api", "user", "notifications"], Vec::new()).await
    }

    #[instrument(name = "product_reviews.http.unread_count", skip(self))]
    async fn unread_count(&self) -> FwResult<u64> {
        let count: UnreadCount = self
            .get_json(&["api", "user", "notifications", "unread-count"], Vec::new())
            .await?;
        Ok(count.count)
    }

    #[instrument(name = "product_reviews.http.mark_notification_read", skip(self))]
    async fn mark_notification_read(&self, id: u64) -> FwResult<()> {
        self.send_empty(Method::PUT, &["api", "user", "notifications", &id.to_string(), "read"])
            .await
    }

    #[instrument(name = "product_reviews.http.mark_all_notifications_read", skip(self))]
    async fn mark_all_notifications_read(&self) -> FwResult<()> {
        self.send_empty(Method::PUT, &["api", "user", "notifications", "read-all"])
            .await
    }

    #[instrument(name = "product_reviews.http.create_notification", skip_all)]
    async fn create_notification(&self, notification: &NewNotification) -> FwResult<()> {
        self.send_raw(Method::POST, &["api", "user", "notifications"], Some(notification))
            .await?;
        Ok(())
    }

    #[instrument(name = "product_reviews.http.delete_notification", skip(self))]
    async fn delete_notification(&self, id: u64) -> FwResult<()> {
        self.send_empty(Method::DELETE, &["api", "user", "notifications", &id.to_string()])
            .await
    }

    #[instrument(name = "product_reviews.http.delete_all_notifications", skip(self))]
    async fn delete_all_notifications(&self) -> FwResult<()> {
        self.send_empty(Method::DELETE, &["api", "user", "notifications"])
            .await
    }
}
