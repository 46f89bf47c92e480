use std::collections::HashSet;
use std::sync::Arc;

use fwkit::{
    fetcher_fn, FwError, ListSnapshot, OptimisticCell, PageCursor, PageRequest, Paginator,
    PagingResult,
};
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::contract::client::ReviewApi;
use crate::contract::model::{Review, DEFAULT_REVIEW_SORT};
use crate::domain::error::{DomainError, DomainResult};

/// Reviews of one product plus the device's helpful votes.
pub struct ReviewFeed {
    api: Arc<dyn ReviewApi>,
    product_id: u64,
    rating_filter: Arc<RwLock<Option<u8>>>,
    paginator: Paginator<Review>,
    votes: OptimisticCell<HashSet<u64>>,
}

impl ReviewFeed {
    pub fn new(api: Arc<dyn ReviewApi>, product_id: u64, page_size: u32) -> Self {
        let rating_filter = Arc::new(RwLock::new(None));
        let paginator = {
            let api = api.clone();
            let rating_filter = rating_filter.clone();
            Paginator::new(fetcher_fn(move |cursor: Option<PageCursor>| {
                let api = api.clone();
                let rating = *rating_filter.read();
                let request =
                    PageRequest::from_cursor(cursor.as_ref(), page_size).sorted(DEFAULT_REVIEW_SORT);
                async move { api.list_reviews(product_id, rating, request).await }
            }))
        };
        Self {
            api,
            product_id,
            rating_filter,
            paginator,
            votes: OptimisticCell::new(HashSet::new()),
        }
    }

    pub fn product_id(&self) -> u64 {
        self.product_id
    }

    /// Load the first page and the voted set.
    #[instrument(name = "product_reviews.reviews.load", skip(self), fields(product_id = self.product_id))]
    pub async fn load(&self) -> DomainResult<PagingResult<Review>> {
        let (page, voted) = tokio::join!(self.paginator.load_first(), self.api.voted_reviews());
        match voted {
            Ok(ids) => self.votes.replace(ids.into_iter().collect()).await,
            Err(e) => warn!(error = %e, "voted reviews unavailable"),
        }
        Ok(page?)
    }

    #[instrument(name = "product_reviews.reviews.load_more", skip(self), fields(product_id = self.product_id))]
    pub async fn load_more(&self) -> DomainResult<PagingResult<Review>> {
        Ok(self.paginator.load_next().await?)
    }

    #[instrument(name = "product_reviews.reviews.refresh", skip(self), fields(product_id = self.product_id))]
    pub async fn refresh(&self) -> DomainResult<PagingResult<Review>> {
        Ok(self.paginator.refresh().await?)
    }

    pub fn rating_filter(&self) -> Option<u8> {
        *self.rating_filter.read()
    }

    /// Change the star filter and reload from the first page.
    #[instrument(name = "product_reviews.reviews.set_rating_filter", skip(self), fields(product_id = self.product_id))]
    pub async fn set_rating_filter(&self, rating: Option<u8>) -> DomainResult<PagingResult<Review>> {
        if let Some(r) = rating {
            if !(1..=5).contains(&r) {
                return Err(DomainError::validation("rating", "filter must be between 1 and 5"));
            }
        }
        *self.rating_filter.write() = rating;
        Ok(self.paginator.load_first().await?)
    }

    pub fn has_voted(&self, review_id: u64) -> bool {
        self.votes.read(|v| v.contains(&review_id))
    }

    pub fn voted(&self) -> HashSet<u64> {
        self.votes.get()
    }

    /// Flip the device's helpful vote. The count and vote are updated before
    /// the request and restored if it fails; on success the server's copy of
    /// the review replaces the local one.
    #[instrument(name = "product_reviews.reviews.toggle_helpful", skip(self), fields(product_id = self.product_id))]
    pub async fn toggle_helpful(&self, review_id: u64) -> DomainResult<Review> {
        let tx = self.votes.begin().await;
        let was_voted = tx.current(|v| v.contains(&review_id));
        let prior = self
            .paginator
            .items()
            .into_iter()
            .find(|r| r.id == Some(review_id));

        tx.apply(|v| {
            if was_voted {
                v.remove(&review_id);
            } else {
                v.insert(review_id);
            }
        });
        self.paginator.update_item(
            |r| r.id == Some(review_id),
            |r| {
                r.helpful_count = if was_voted {
                    r.helpful_count.saturating_sub(1)
                } else {
                    r.helpful_count + 1
                };
            },
        );
        let restore = RestoreReview {
            paginator: &self.paginator,
            prior,
        };

        match self.api.toggle_helpful(review_id).await {
            Ok(server) => {
                restore.disarm();
                let confirmed = server.clone();
                self.paginator
                    .update_item(|r| r.id == Some(review_id), |r| *r = confirmed.clone());
                tx.commit();
                info!(review_id, voted = !was_voted, helpful = server.helpful_count, "helpful vote updated");
                Ok(server)
            }
            Err(e) => {
                debug!(review_id, error = %e, "helpful toggle failed, restoring");
                drop(restore);
                tx.rollback();
                Err(DomainError::Api(e))
            }
        }
    }

    pub fn snapshot(&self) -> ListSnapshot<Review> {
        self.paginator.snapshot()
    }

    pub fn items(&self) -> Vec<Review> {
        self.paginator.items()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<Review>> {
        self.paginator.subscribe()
    }

    pub fn subscribe_votes(&self) -> watch::Receiver<HashSet<u64>> {
        self.votes.subscribe()
    }

    pub fn paginator(&self) -> &Paginator<Review> {
        &self.paginator
    }

    /// Insert a review the user just posted at the top of the feed.
    pub fn prepend(&self, review: Review) {
        self.paginator.add_item_at_start(review);
    }

    pub fn last_error(&self) -> Option<FwError> {
        self.paginator.paging_state().error
    }
}

/// Puts the pre-toggle review back unless disarmed.
struct RestoreReview<'a> {
    paginator: &'a Paginator<Review>,
    prior: Option<Review>,
}

impl RestoreReview<'_> {
    fn disarm(mut self) {
        self.prior = None;
    }
}

impl Drop for RestoreReview<'_> {
    fn drop(&mut self) {
        if let Some(prior) = self.prior.take() {
            let id = prior.id;
            self.paginator.update_item(|r| r.id == id, |r| *r = prior.clone());
        }
    }
}
