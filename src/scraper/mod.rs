//! Browser automation against the student portal.
//!
//! `PortalPage` is the capability surface a browser driver must offer,
//! `PortalScraper` drives the login flow over it, and `chromium` provides the
//! headless Chromium implementation.

pub mod chromium;
pub mod portal;

pub use chromium::ChromiumLauncher;
pub use portal::PortalScraper;

use crate::models::StudentRecord;
use crate::utils::AppError;
use async_trait::async_trait;

/// Produces a fresh student record for a username.
#[async_trait]
pub trait RecordScraper: Send + Sync {
    async fn scrape(&self, username: &str) -> Result<StudentRecord, AppError>;
}

/// Starts one browser process with one open page.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PortalPage>, AppError>;
}

/// A single page of a launched browser.
#[async_trait]
pub trait PortalPage: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), AppError>;
    /// Blocks until `selector` matches an element or the driver timeout elapses.
    async fn wait_for(&self, selector: &str) -> Result<(), AppError>;
    async fn type_text(&self, selector: &str, text: &str) -> Result<(), AppError>;
    async fn click(&self, selector: &str) -> Result<(), AppError>;
    /// `textContent` of the first element matching `selector`.
    async fn text_content(&self, selector: &str) -> Result<String, AppError>;
    /// Trimmed inner text of every `cell_selector` element inside every
    /// `row_selector` element.
    async fn table_rows(
        &self,
        row_selector: &str,
        cell_selector: &str,
    ) -> Result<Vec<Vec<String>>, AppError>;
    /// Shuts down the page and its browser process.
    async fn close(self: Box<Self>) -> Result<(), AppError>;
}
