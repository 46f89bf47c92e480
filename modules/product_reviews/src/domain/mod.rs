pub mod assistant;
pub mod catalog;
pub mod error;
pub mod notifications;
pub mod preferences;
pub mod review_feed;
pub mod wishlist;
