use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use fwkit::{Paginator, TracedClient};
use runtime::{AppConfig, AppConfigProvider, ConfigProvider};
use tracing::info;
use url::Url;

use crate::config::ProductReviewsConfig;
use crate::contract::client::ReviewApi;
use crate::contract::model::{Product, ProductQuery};
use crate::domain::assistant::AssistantSession;
use crate::domain::catalog::CatalogService;
use crate::domain::notifications::NotificationCenter;
use crate::domain::preferences::{PreferenceStore, Preferences};
use crate::domain::review_feed::ReviewFeed;
use crate::domain::wishlist::WishlistService;
use crate::infra::{FilePreferenceStore, HttpReviewApi};

/// Wired client: one backend port shared by every service.
pub struct ProductReviews {
    config: ProductReviewsConfig,
    api: Arc<dyn ReviewApi>,
    prefs: Arc<Preferences>,
    catalog: CatalogService,
    wishlist: WishlistService,
    notifications: NotificationCenter,
}

impl ProductReviews {
    pub const MODULE_NAME: &'static str = "product_reviews";

    /// Build from the application config: preferences under the home dir,
    /// HTTP adapter identified by the stored (or configured) device id.
    pub fn from_app_config(app: &AppConfig) -> Result<Self> {
        let provider = AppConfigProvider::new(app.clone());
        let config: ProductReviewsConfig = provider.module_config(Self::MODULE_NAME);

        let prefs_path = app.home_dir().join(&config.preferences_file);
        let store: Arc<dyn PreferenceStore> = Arc::new(FilePreferenceStore::new(prefs_path));
        let prefs = Arc::new(
            Preferences::open(store, config.search_history_limit)
                .context("Failed to open preferences")?,
        );

        let user_id = match &app.client.user_id {
            Some(id) => id.clone(),
            None => prefs.user_id().context("Failed to resolve device user id")?,
        };
        let client = TracedClient::for_user(&user_id, Duration::from_secs(app.client.timeout_sec))
            .context("Failed to build HTTP client")?;
        let base = Url::parse(&app.client.base_url)
            .with_context(|| format!("Invalid client.base_url: {}", app.client.base_url))?;
        info!(base_url = %base, "product_reviews client ready");

        let api: Arc<dyn ReviewApi> = Arc::new(HttpReviewApi::new(client, base, config.retry.clone()));
        Ok(Self::with_api(api, prefs, config))
    }

    pub fn with_api(
        api: Arc<dyn ReviewApi>,
        prefs: Arc<Preferences>,
        config: ProductReviewsConfig,
    ) -> Self {
        Self {
            catalog: CatalogService::new(api.clone(), config.products_page_size),
            wishlist: WishlistService::new(api.clone(), prefs.clone(), config.wishlist_page_size),
            notifications: NotificationCenter::new(api.clone()),
            api,
            prefs,
            config,
        }
    }

    pub fn config(&self) -> &ProductReviewsConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn wishlist(&self) -> &WishlistService {
        &self.wishlist
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// Catalog paginator using the stored sort preference.
    pub fn products(&self, category: Option<&str>, search: Option<&str>) -> Paginator<Product> {
        let query = ProductQuery::default()
            .sorted(self.prefs.sort_preference())
            .with_category(category)
            .with_search(search);
        self.catalog.products_paginator(query)
    }

    pub fn review_feed(&self, product_id: u64) -> ReviewFeed {
        ReviewFeed::new(self.api.clone(), product_id, self.config.reviews_page_size)
    }

    pub fn assistant(&self, product_id: u64, product_name: &str) -> AssistantSession {
        AssistantSession::new(self.api.clone(), product_id, product_name)
    }
}
