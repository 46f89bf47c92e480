// === PUBLIC CONTRACT ===
// Models, the backend port and the errors other crates are expected to use.
pub mod contract;

pub use contract::{client, error, model};

// === CLIENT FACADE ===
pub mod module;
pub use module::ProductReviews;

// === INTERNAL MODULES ===
// Exposed for tests and the CLI; prefer `contract` and `ProductReviews`.
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
