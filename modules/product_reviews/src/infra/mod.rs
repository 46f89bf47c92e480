pub mod http_api;
pub mod prefs_store;

pub use http_api::HttpReviewApi;
pub use prefs_store::{FilePreferenceStore, MemoryPreferenceStore};
