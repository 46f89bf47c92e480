use serde::{Deserialize, Serialize};

use crate::page::{Page, PageCursor};

/// Spring-style page envelope as returned by the backend list endpoints.
///
/// Every field is optional on the wire; missing metadata means "single, last page".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpringPage<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u64>,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default = "default_last")]
    pub last: bool,
}

fn default_last() -> bool {
    true
}

impl<T> SpringPage<T> {
    /// Convert into a cursor page: the next cursor is `number + 1` unless this is the last page.
    /// Totals the backend left out stay unknown.
    pub fn into_page(self) -> Page<T> {
        let next_cursor = if self.last {
            None
        } else {
            self.number.checked_add(1).map(PageCursor::from_page_number)
        };
        Page {
            items: self.content,
            next_cursor,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

impl<T> From<SpringPage<T>> for Page<T> {
    fn from(envelope: SpringPage<T>) -> Self {
        envelope.into_page()
    }
}
