use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::contract::model::{ThemeMode, DEFAULT_PRODUCT_SORT};
use crate::domain::error::{DomainError, DomainResult};

/// Everything persisted on the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceData {
    pub user_id: Option<String>,
    pub theme_mode: ThemeMode,
    pub sort_preference: String,
    pub grid_columns: u8,
    /// Most recent first.
    pub search_history: Vec<String>,
    pub wishlist_ids: Vec<u64>,
}

impl Default for PreferenceData {
    fn default() -> Self {
        Self {
            user_id: None,
            theme_mode: ThemeMode::System,
            sort_preference: DEFAULT_PRODUCT_SORT.to_string(),
            grid_columns: 2,
            search_history: Vec::new(),
            wishlist_ids: Vec::new(),
        }
    }
}

/// Storage port for [`PreferenceData`].
pub trait PreferenceStore: Send + Sync {
    fn load(&self) -> DomainResult<PreferenceData>;
    fn save(&self, data: &PreferenceData) -> DomainResult<()>;
}

/// Device preferences with write-through persistence.
pub struct Preferences {
    store: Arc<dyn PreferenceStore>,
    data: RwLock<PreferenceData>,
    history_limit: usize,
}

impl Preferences {
    pub fn open(store: Arc<dyn PreferenceStore>, history_limit: usize) -> DomainResult<Self> {
        let data = store.load()?;
        debug!(history = data.search_history.len(), wishlist = data.wishlist_ids.len(), "preferences loaded");
        Ok(Self {
            store,
            data: RwLock::new(data),
            history_limit,
        })
    }

    fn update(&self, f: impl FnOnce(&mut PreferenceData)) -> DomainResult<()> {
        let mut data = self.data.write();
        let mut next = data.clone();
        f(&mut next);
        if next != *data {
            self.store.save(&next)?;
            *data = next;
        }
        Ok(())
    }

    pub fn snapshot(&self) -> PreferenceData {
        self.data.read().clone()
    }

    /// Device identity sent as `X-User-ID`; generated and stored on first use.
    pub fn user_id(&self) -> DomainResult<String> {
        if let Some(id) = self.data.read().user_id.clone() {
            return Ok(id);
        }
        let mut generated = None;
        self.update(|d| {
            let id = d
                .user_id
                .get_or_insert_with(|| Uuid::new_v4().to_string())
                .clone();
            generated = Some(id);
        })?;
        let id = generated.ok_or_else(|| DomainError::storage("user id was not generated"))?;
        info!(user_id = %id, "device user id created");
        Ok(id)
    }

    pub fn theme_mode(&self) -> ThemeMode {
        self.data.read().theme_mode
    }

    pub fn set_theme_mode(&self, mode: ThemeMode) -> DomainResult<()> {
        self.update(|d| d.theme_mode = mode)
    }

    pub fn sort_preference(&self) -> String {
        self.data.read().sort_preference.clone()
    }

    pub fn set_sort_preference(&self, sort: &str) -> DomainResult<()> {
        let sort = sort.trim();
        if sort.is_empty() {
            return Err(DomainError::validation("sort", "must not be empty"));
        }
        self.update(|d| d.sort_preference = sort.to_string())
    }

    pub fn grid_columns(&self) -> u8 {
        self.data.read().grid_columns
    }

    pub fn set_grid_columns(&self, columns: u8) -> DomainResult<()> {
        if columns == 0 {
            return Err(DomainError::validation("grid_columns", "must be at least 1"));
        }
        self.update(|d| d.grid_columns = columns)
    }

    pub fn search_history(&self) -> Vec<String> {
        self.data.read().search_history.clone()
    }

    /// Move `term` to the front, dropping case-insensitive duplicates and
    /// anything past the configured limit. Blank terms are ignored.
    pub fn add_search_term(&self, term: &str) -> DomainResult<()> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(());
        }
        let limit = self.history_limit;
        self.update(|d| {
            d.search_history.retain(|t| !t.eq_ignore_ascii_case(term));
            d.search_history.insert(0, term.to_string());
            d.search_history.truncate(limit);
        })
    }

    pub fn remove_search_term(&self, term: &str) -> DomainResult<()> {
        self.update(|d| d.search_history.retain(|t| !t.eq_ignore_ascii_case(term.trim())))
    }

    pub fn clear_search_history(&self) -> DomainResult<()> {
        self.update(|d| d.search_history.clear())
    }

    pub fn wishlist_ids(&self) -> Vec<u64> {
        self.data.read().wishlist_ids.clone()
    }

    pub fn set_wishlist_ids(&self, ids: impl IntoIterator<Item = u64>) -> DomainResult<()> {
        let mut ids: Vec<u64> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        self.update(|d| d.wishlist_ids = ids)
    }
}
