use crate::error::FwError;

/// Loading flags and counters for one paginated list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PagingState {
    pub is_loading: bool,
    pub is_loading_more: bool,
    pub has_more: bool,
    pub current_page: u32,
    pub total_pages: Option<u64>,
    pub total_elements: u64,
    pub error: Option<FwError>,
}

impl Default for PagingState {
    fn default() -> Self {
        Self {
            is_loading: false,
            is_loading_more: false,
            has_more: true,
            current_page: 0,
            total_pages: None,
            total_elements: 0,
            error: None,
        }
    }
}

impl PagingState {
    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.is_loading && !self.is_loading_more && self.error.is_none()
    }

    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_loading_more
    }

    /// First load in flight with nothing to show yet.
    pub fn is_initial_loading(&self) -> bool {
        self.is_loading && self.total_elements == 0
    }

    /// Loaded, not loading, and nothing came back.
    pub fn is_empty(&self) -> bool {
        !self.is_busy() && self.error.is_none() && self.total_elements == 0 && !self.has_more
    }
}

/// Outcome of one successful load.
#[derive(Clone, Debug, PartialEq)]
pub struct PagingResult<T> {
    /// Items of the page just fetched.
    pub items: Vec<T>,
    pub has_more: bool,
    pub current_page: u32,
    pub total_pages: Option<u64>,
    pub total_elements: u64,
}
