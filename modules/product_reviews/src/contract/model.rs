use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use fwkit::{PageCursor, PageRequest};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u64>,
    /// Star rating (1-5) to number of reviews.
    #[serde(default)]
    pub rating_breakdown: Option<BTreeMap<u8, u64>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ai_summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub reviewer_name: Option<String>,
    pub rating: u8,
    pub comment: String,
    #[serde(default)]
    pub helpful_count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Review submission body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub reviewer_name: Option<String>,
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalStats {
    pub total_products: u64,
    pub total_reviews: u64,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub count: u64,
}

/// Notification identity: assigned by the server, or a local placeholder
/// (`local-<millis>`) for an entry the server has not confirmed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationId {
    Server(u64),
    Local(i64),
}

const LOCAL_PREFIX: &str = "local-";

impl NotificationId {
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    pub fn server_id(&self) -> Option<u64> {
        match self {
            Self::Server(id) => Some(*id),
            Self::Local(_) => None,
        }
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(id) => write!(f, "{id}"),
            Self::Local(millis) => write!(f, "{LOCAL_PREFIX}{millis}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid notification id: {0}")]
pub struct ParseNotificationIdError(String);

impl FromStr for NotificationId {
    type Err = ParseNotificationIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix(LOCAL_PREFIX) {
            Some(millis) => millis.parse().map(Self::Local).ok(),
            None => s.parse().map(Self::Server).ok(),
        };
        parsed.ok_or_else(|| ParseNotificationIdError(s.to_string()))
    }
}

impl Serialize for NotificationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Server(id) => serializer.serialize_u64(*id),
            Self::Local(_) => serializer.collect_str(self),
        }
    }
}

impl<'de> Deserialize<'de> for NotificationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = NotificationId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a numeric id or a \"local-<millis>\" string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(NotificationId::Server(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map(NotificationId::Server)
                    .map_err(|_| E::custom("negative notification id"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Client-side category; the backend does not send one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Review,
    Order,
    #[default]
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    #[serde(rename = "read", default)]
    pub is_read: bool,
    pub created_at: String,
    #[serde(default)]
    pub product_id: Option<u64>,
    #[serde(default, skip_serializing)]
    pub kind: NotificationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u64>,
}

/// Wishlist entry cached on the device.
#[derive(Debug, Clone, PartialEq)]
pub struct WishlistItem {
    pub id: u64,
    pub name: String,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub average_rating: Option<f64>,
    pub review_count: Option<u64>,
}

impl From<&Product> for WishlistItem {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            price: Some(p.price),
            image_url: p.image_url.clone(),
            category: p.categories.first().cloned(),
            average_rating: p.average_rating,
            review_count: p.review_count,
        }
    }
}

/// Catalog listing filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub sort: String,
    pub category: Option<String>,
    pub search: Option<String>,
}

pub const ALL_CATEGORIES: &str = "All";
pub const DEFAULT_PRODUCT_SORT: &str = "name,asc";
pub const DEFAULT_REVIEW_SORT: &str = "createdAt,desc";
pub const DEFAULT_WISHLIST_SORT: &str = "id,desc";

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            sort: DEFAULT_PRODUCT_SORT.to_string(),
            category: None,
            search: None,
        }
    }
}

impl ProductQuery {
    pub fn sorted(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    /// `"All"` and blank values clear the filter.
    pub fn with_category(mut self, category: Option<&str>) -> Self {
        self.category = category
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
            .map(str::to_owned);
        self
    }

    /// Page request for `cursor`, carrying this query's sort order.
    pub fn page_request(&self, cursor: Option<&PageCursor>, size: u32) -> PageRequest {
        PageRequest::from_cursor(cursor, size).sorted(self.sort.clone())
    }

    /// Blank search terms clear the filter.
    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(format!("unknown theme mode: {other}")),
        }
    }
}
