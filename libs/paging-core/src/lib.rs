//! Transport-neutral page types shared by list endpoints and paginators.

pub mod envelope;
pub mod page;
pub mod request;

pub use envelope::SpringPage;
pub use page::{Page, PageCursor};
pub use request::PageRequest;
