use crate::page::PageCursor;

/// Page-number request rendered as `page`/`size`/`sort` query parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Option<String>,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort: None,
        }
    }

    /// Request for the page a cursor points at; no cursor means the first page.
    pub fn from_cursor(cursor: Option<&PageCursor>, size: u32) -> Self {
        Self::new(cursor.map(PageCursor::to_page_number).unwrap_or(0), size)
    }

    pub fn sorted(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        pairs
    }
}
