use std::collections::HashSet;
use std::sync::Arc;

use fwkit::{fetcher_fn, Page, PageCursor, Paginator};
use tracing::{debug, info, instrument};

use crate::contract::client::ReviewApi;
use crate::contract::model::{GlobalStats, NewReview, Product, ProductQuery, Review};
use crate::domain::error::{DomainError, DomainResult};

const MAX_COMMENT_LEN: usize = 2000;

/// Catalog reads, review submission and the product chat endpoint.
#[derive(Clone)]
pub struct CatalogService {
    api: Arc<dyn ReviewApi>,
    page_size: u32,
}

impl CatalogService {
    pub fn new(api: Arc<dyn ReviewApi>, page_size: u32) -> Self {
        Self { api, page_size }
    }

    #[instrument(
        name = "product_reviews.catalog.products_page",
        skip(self, query, cursor),
        fields(page = cursor.map_or(0, PageCursor::to_page_number), page_size = self.page_size, sort = %query.sort)
    )]
    pub async fn products_page(
        &self,
        query: &ProductQuery,
        cursor: Option<&PageCursor>,
    ) -> DomainResult<Page<Product>> {
        let page = self
            .api
            .list_products(query, query.page_request(cursor, self.page_size))
            .await?;
        debug!(count = page.len(), has_more = page.has_more(), "products page loaded");
        Ok(page)
    }

    /// Paginator over the catalog for one filter combination.
    pub fn products_paginator(&self, query: ProductQuery) -> Paginator<Product> {
        let api = self.api.clone();
        let size = self.page_size;
        Paginator::new(fetcher_fn(move |cursor: Option<PageCursor>| {
            let api = api.clone();
            let request = query.page_request(cursor.as_ref(), size);
            let query = query.clone();
            async move { api.list_products(&query, request).await }
        }))
    }

    #[instrument(name = "product_reviews.catalog.product", skip(self))]
    pub async fn product(&self, id: u64) -> DomainResult<Product> {
        Ok(self.api.get_product(id).await?)
    }

    #[instrument(name = "product_reviews.catalog.global_stats", skip_all)]
    pub async fn global_stats(&self, query: &ProductQuery) -> DomainResult<GlobalStats> {
        Ok(self
            .api
            .global_stats(query.category.as_deref(), query.search.as_deref())
            .await?)
    }

    #[instrument(
        name = "product_reviews.catalog.post_review",
        skip(self, review),
        fields(rating = review.rating)
    )]
    pub async fn post_review(&self, product_id: u64, review: NewReview) -> DomainResult<Review> {
        let review = validate_review(review)?;
        let created = self.api.post_review(product_id, &review).await?;
        info!(review_id = ?created.id, "review submitted");
        Ok(created)
    }

    #[instrument(name = "product_reviews.catalog.voted_reviews", skip_all)]
    pub async fn voted_reviews(&self) -> DomainResult<HashSet<u64>> {
        Ok(self.api.voted_reviews().await?.into_iter().collect())
    }

    #[instrument(name = "product_reviews.catalog.ask", skip(self, question))]
    pub async fn ask(&self, product_id: u64, question: &str) -> DomainResult<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::validation("question", "must not be empty"));
        }
        Ok(self.api.chat(product_id, question).await?.answer)
    }
}

/// Trim, check bounds and drop a blank reviewer name.
pub fn validate_review(review: NewReview) -> DomainResult<NewReview> {
    if !(1..=5).contains(&review.rating) {
        return Err(DomainError::validation(
            "rating",
            format!("must be between 1 and 5, got {}", review.rating),
        ));
    }
    let comment = review.comment.trim();
    if comment.is_empty() {
        return Err(DomainError::validation("comment", "must not be empty"));
    }
    if comment.chars().count() > MAX_COMMENT_LEN {
        return Err(DomainError::validation(
            "comment",
            format!("must be at most {MAX_COMMENT_LEN} characters"),
        ));
    }
    let reviewer_name = review
        .reviewer_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_owned);
    Ok(NewReview {
        reviewer_name,
        rating: review.rating,
        comment: comment.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: u8, comment: &str, name: Option<&str>) -> NewReview {
        NewReview {
            reviewer_name: name.map(str::to_owned),
            rating,
            comment: comment.to_string(),
        }
    }

    #[test]
    fn rating_must_be_in_range() {
        assert!(validate_review(review(0, "ok", None)).is_err());
        assert!(validate_review(review(6, "ok", None)).is_err());
        assert!(validate_review(review(5, "ok", None)).is_ok());
    }

    #[test]
    fn comment_is_trimmed_and_required() {
        assert!(matches!(
            validate_review(review(3, "   ", None)),
            Err(DomainError::Validation { field: "comment", .. })
        ));
        let ok = validate_review(review(3, "  nice  ", Some("  "))).unwrap();
        assert_eq!(ok.comment, "nice");
        assert_eq!(ok.reviewer_name, None);
    }
}
