use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token identifying the next page to fetch.
///
/// The backend paginates by page number, so the token carries that number
/// rendered as a string. Callers must not rely on the representation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn from_page_number(page: u32) -> Self {
        Self(page.to_string())
    }

    /// Page number encoded in the cursor; unparseable tokens map to page 0.
    pub fn to_page_number(&self) -> u32 {
        self.0.parse().unwrap_or(0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of results.
///
/// `next_cursor` is `None` exactly when no further pages exist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<PageCursor>,
    #[serde(default)]
    pub total_elements: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u64>,
}

impl<T> Page<T> {
    /// Create a page without totals.
    pub fn new(items: Vec<T>, next_cursor: Option<PageCursor>) -> Self {
        Self {
            items,
            next_cursor,
            total_elements: None,
            total_pages: None,
        }
    }

    /// Terminal page with no items.
    pub fn empty() -> Self {
        Self::new(Vec::new(), None)
    }

    pub fn with_totals(mut self, total_elements: u64, total_pages: u64) -> Self {
        self.total_elements = Some(total_elements);
        self.total_pages = Some(total_pages);
        self
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Map items while preserving cursor and totals (wire DTO -> domain mapping convenience)
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}
