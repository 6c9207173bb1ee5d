//! Headless-browser research backend.
//!
//! [`SessionManager`] owns one lazily launched Chromium process and hands
//! out cookie-isolated page contexts; [`BrowserBackend`] drives those pages
//! and extracts fields from the rendered HTML.

pub mod backend;
pub mod error;
pub mod extract;
pub mod session;

pub use backend::{BrowserBackend, ScrapeKind};
pub use error::BrowserError;
pub use session::{BrowserHandle, PageContext, SessionManager};
