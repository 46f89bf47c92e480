use fwkit::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Configuration for the product_reviews module (`modules.product_reviews`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductReviewsConfig {
    #[serde(default = "default_page_size")]
    pub products_page_size: u32,
    #[serde(default = "default_page_size")]
    pub reviews_page_size: u32,
    #[serde(default = "default_page_size")]
    pub wishlist_page_size: u32,
    #[serde(default = "default_search_history_limit")]
    pub search_history_limit: usize,
    #[serde(default = "default_preferences_file")]
    pub preferences_file: String,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for ProductReviewsConfig {
    fn default() -> Self {
        Self {
            products_page_size: default_page_size(),
            reviews_page_size: default_page_size(),
            wishlist_page_size: default_page_size(),
            search_history_limit: default_search_history_limit(),
            preferences_file: default_preferences_file(),
            retry: RetryPolicy::default(),
        }
    }
}

fn default_page_size() -> u32 {
    10
}

fn default_search_history_limit() -> usize {
    10
}

fn default_preferences_file() -> String {
    "preferences.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: ProductReviewsConfig = serde_json::from_value(serde_json::json!({
            "reviews_page_size": 5,
            "retry": { "max_attempts": 1 }
        }))
        .unwrap();
        assert_eq!(cfg.reviews_page_size, 5);
        assert_eq!(cfg.products_page_size, 10);
        assert_eq!(cfg.search_history_limit, 10);
        assert_eq!(cfg.retry.max_attempts, 1);
        assert_eq!(cfg.retry.base_delay_ms, 1000);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res = serde_json::from_value::<ProductReviewsConfig>(serde_json::json!({
            "page_size": 5
        }));
        assert!(res.is_err());
    }
}
