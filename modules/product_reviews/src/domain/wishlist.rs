use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use fwkit::{fetcher_fn, FwError, OptimisticCell, Page, PageCursor, PageRequest, Paginator, Transaction};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::contract::client::ReviewApi;
use crate::contract::model::{Product, WishlistItem, DEFAULT_WISHLIST_SORT};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::preferences::Preferences;

/// Cached wishlist: the id set drives membership checks, `items` keeps
/// whatever product details the device has seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WishlistState {
    pub ids: BTreeSet<u64>,
    pub items: Vec<WishlistItem>,
}

impl WishlistState {
    fn insert(&mut self, product: &Product) {
        if self.ids.insert(product.id) {
            self.items.insert(0, WishlistItem::from(product));
        }
    }

    fn remove(&mut self, id: u64) {
        self.ids.remove(&id);
        self.items.retain(|i| i.id != id);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOp {
    Add,
    Remove,
}

impl BatchOp {
    fn verb(self) -> &'static str {
        match self {
            Self::Add => "added",
            Self::Remove => "removed",
        }
    }
}

/// Outcome of a batch that went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub op: BatchOp,
    pub requested: usize,
    pub changed: Vec<u64>,
    /// Already in the requested state; no call was made.
    pub unchanged: Vec<u64>,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} of {}", self.op.verb(), self.changed.len(), self.requested)
    }
}

pub struct WishlistService {
    api: Arc<dyn ReviewApi>,
    prefs: Arc<Preferences>,
    cell: OptimisticCell<WishlistState>,
    page_size: u32,
}

impl WishlistService {
    /// Seeds membership from the id set cached in preferences.
    pub fn new(api: Arc<dyn ReviewApi>, prefs: Arc<Preferences>, page_size: u32) -> Self {
        let cached = WishlistState {
            ids: prefs.wishlist_ids().into_iter().collect(),
            items: Vec::new(),
        };
        Self {
            api,
            prefs,
            cell: OptimisticCell::new(cached),
            page_size,
        }
    }

    /// Replace the cached id set with the server's.
    #[instrument(name = "product_reviews.wishlist.load", skip(self))]
    pub async fn load(&self) -> DomainResult<BTreeSet<u64>> {
        let ids: BTreeSet<u64> = self.api.wishlist_ids().await?.into_iter().collect();
        let mut next = self.cell.get();
        next.items.retain(|i| ids.contains(&i.id));
        next.ids = ids.clone();
        self.cell.replace(next).await;
        self.persist();
        debug!(count = ids.len(), "wishlist loaded");
        Ok(ids)
    }

    /// One page of wishlist products; cached items are refreshed from it.
    #[instrument(name = "product_reviews.wishlist.products_page", skip(self, cursor))]
    pub async fn products_page(&self, cursor: Option<&PageCursor>) -> DomainResult<Page<Product>> {
        let request = PageRequest::from_cursor(cursor, self.page_size).sorted(DEFAULT_WISHLIST_SORT);
        let page = self.api.wishlist_products(request).await?;
        self.cell.update(|s| {
            for product in &page.items {
                let fresh = WishlistItem::from(product);
                match s.items.iter_mut().find(|i| i.id == product.id) {
                    Some(existing) => *existing = fresh,
                    None => s.items.push(fresh),
                }
                s.ids.insert(product.id);
            }
        });
        Ok(page)
    }

    pub fn products_paginator(&self) -> Paginator<Product> {
        let api = self.api.clone();
        let size = self.page_size;
        Paginator::new(fetcher_fn(move |cursor: Option<PageCursor>| {
            let api = api.clone();
            let request = PageRequest::from_cursor(cursor.as_ref(), size).sorted(DEFAULT_WISHLIST_SORT);
            async move { api.wishlist_products(request).await }
        }))
    }

    pub fn is_in_wishlist(&self, product_id: u64) -> bool {
        self.cell.read(|s| s.ids.contains(&product_id))
    }

    pub fn count(&self) -> usize {
        self.cell.read(|s| s.ids.len())
    }

    pub fn ids(&self) -> BTreeSet<u64> {
        self.cell.read(|s| s.ids.clone())
    }

    pub fn items(&self) -> Vec<WishlistItem> {
        self.cell.read(|s| s.items.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<WishlistState> {
        self.cell.subscribe()
    }

    /// Flip membership; returns whether the product is now in the wishlist.
    #[instrument(name = "product_reviews.wishlist.toggle", skip(self, product), fields(product_id = product.id))]
    pub async fn toggle(&self, product: &Product) -> DomainResult<bool> {
        let tx = self.cell.begin().await;
        let adding = !tx.current(|s| s.ids.contains(&product.id));
        self.flip(tx, product.id, adding.then_some(product)).await?;
        Ok(adding)
    }

    /// No call is made when the product is already present.
    #[instrument(name = "product_reviews.wishlist.add", skip(self, product), fields(product_id = product.id))]
    pub async fn add(&self, product: &Product) -> DomainResult<()> {
        let tx = self.cell.begin().await;
        if tx.current(|s| s.ids.contains(&product.id)) {
            tx.commit();
            return Ok(());
        }
        self.flip(tx, product.id, Some(product)).await
    }

    /// No call is made when the product is already absent.
    #[instrument(name = "product_reviews.wishlist.remove", skip(self))]
    pub async fn remove(&self, product_id: u64) -> DomainResult<()> {
        let tx = self.cell.begin().await;
        if !tx.current(|s| s.ids.contains(&product_id)) {
            tx.commit();
            return Ok(());
        }
        self.flip(tx, product_id, None).await
    }

    /// Insert `added` (or remove `product_id` when `None`) and confirm with the server.
    async fn flip(
        &self,
        tx: Transaction<'_, WishlistState>,
        product_id: u64,
        added: Option<&Product>,
    ) -> DomainResult<()> {
        tx.apply(|s| match added {
            Some(product) => s.insert(product),
            None => s.remove(product_id),
        });
        match self.api.toggle_wishlist(product_id).await {
            Ok(()) => {
                tx.commit();
                self.persist();
                info!(product_id, in_wishlist = added.is_some(), "wishlist updated");
                Ok(())
            }
            Err(e) => {
                warn!(product_id, error = %e, "wishlist update failed, rolled back");
                tx.rollback();
                Err(DomainError::Api(e))
            }
        }
    }

    /// Add every product not already present, all or nothing.
    /// Repeated ids are toggled once and reported as unchanged.
    #[instrument(name = "product_reviews.wishlist.add_multiple", skip_all, fields(requested = products.len()))]
    pub async fn add_multiple(&self, products: &[Product]) -> DomainResult<BatchReport> {
        let tx = self.cell.begin().await;
        let mut seen = BTreeSet::new();
        let (targets, unchanged): (Vec<&Product>, Vec<&Product>) = products
            .iter()
            .partition(|p| seen.insert(p.id) && !tx.current(|s| s.ids.contains(&p.id)));
        tx.apply(|s| targets.iter().for_each(|p| s.insert(p)));
        let ids: Vec<u64> = targets.iter().map(|p| p.id).collect();
        let unchanged = unchanged.iter().map(|p| p.id).collect();
        self.run_batch(tx, BatchOp::Add, products.len(), ids, unchanged)
            .await
    }

    /// Remove every listed id currently present, all or nothing.
    #[instrument(name = "product_reviews.wishlist.remove_multiple", skip_all, fields(requested = ids.len()))]
    pub async fn remove_multiple(&self, ids: &[u64]) -> DomainResult<BatchReport> {
        let tx = self.cell.begin().await;
        let mut seen = BTreeSet::new();
        let (targets, unchanged): (Vec<u64>, Vec<u64>) = ids
            .iter()
            .copied()
            .partition(|id| seen.insert(*id) && tx.current(|s| s.ids.contains(id)));
        tx.apply(|s| targets.iter().for_each(|id| s.remove(*id)));
        self.run_batch(tx, BatchOp::Remove, ids.len(), targets, unchanged)
            .await
    }

    /// Empty the wishlist, all or nothing.
    pub async fn clear(&self) -> DomainResult<BatchReport> {
        let ids: Vec<u64> = self.ids().into_iter().collect();
        self.remove_multiple(&ids).await
    }

    /// Issue one toggle per target. On the first failure, toggles the server
    /// already accepted are toggled back and the local snapshot is restored.
    async fn run_batch(
        &self,
        tx: Transaction<'_, WishlistState>,
        op: BatchOp,
        requested: usize,
        targets: Vec<u64>,
        unchanged: Vec<u64>,
    ) -> DomainResult<BatchReport> {
        let mut applied = Vec::with_capacity(targets.len());
        let mut failure: Option<(u64, FwError)> = None;
        for id in &targets {
            match self.api.toggle_wishlist(*id).await {
                Ok(()) => applied.push(*id),
                Err(e) => {
                    failure = Some((*id, e));
                    break;
                }
            }
        }

        let Some((failed_id, error)) = failure else {
            tx.commit();
            self.persist();
            let report = BatchReport {
                op,
                requested,
                changed: targets,
                unchanged,
            };
            info!(%report, "wishlist batch applied");
            return Ok(report);
        };

        let mut not_reverted = Vec::new();
        for id in applied.iter().rev() {
            if let Err(e) = self.api.toggle_wishlist(*id).await {
                warn!(product_id = id, error = %e, "could not revert wishlist toggle");
                not_reverted.push(*id);
            }
        }
        tx.rollback();

        let mut summary = format!("{} 0 of {}; failed: {}", op.verb(), requested, failed_id);
        if !not_reverted.is_empty() {
            let list: Vec<String> = not_reverted.iter().map(u64::to_string).collect();
            summary.push_str(&format!("; not reverted: {}", list.join(", ")));
            // The server kept these; a reload will reconcile the cache.
        }
        warn!(%summary, error = %error, "wishlist batch rolled back");
        Err(DomainError::BatchFailed {
            summary,
            source: error,
        })
    }

    fn persist(&self) {
        let ids = self.ids();
        if let Err(e) = self.prefs.set_wishlist_ids(ids) {
            warn!(error = %e, "failed to cache wishlist ids");
        }
    }
}
