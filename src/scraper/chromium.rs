//! Headless Chromium driver built on chromiumoxide.

use super::{BrowserLauncher, PortalPage};
use crate::config::{BrowserSettings, LaunchProfile};
use crate::utils::AppError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Resolves the Chromium binary: explicit override, then the deployment
/// target's bundled binary, then `PATH`. `None` leaves detection to
/// chromiumoxide.
pub fn find_chromium(settings: &BrowserSettings) -> Option<PathBuf> {
    if let Some(path) = &settings.executable {
        return Some(path.clone());
    }

    if let Some(path) = settings.profile.default_executable() {
        return Some(path);
    }

    ["google-chrome", "chromium", "chromium-browser"]
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// Launches a fresh headless Chromium for every scrape.
pub struct ChromiumLauncher {
    profile: LaunchProfile,
    executable: Option<PathBuf>,
    selector_timeout: Duration,
}

impl ChromiumLauncher {
    pub fn new(settings: &BrowserSettings) -> Self {
        let executable = find_chromium(settings);
        match &executable {
            Some(path) => log::info!("🧭 Chromium executable: {}", path.display()),
            None => log::warn!("⚠️  Chromium not found on PATH, relying on driver detection"),
        }

        Self {
            profile: settings.profile,
            executable,
            selector_timeout: settings.selector_timeout,
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, AppError> {
        let mut builder = BrowserConfig::builder();
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        for arg in self.profile.args() {
            builder = builder.arg(*arg);
        }

        builder
            .build()
            .map_err(|e| AppError::BrowserError(format!("failed to build browser config: {}", e)))
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn PortalPage>, AppError> {
        let config = self.browser_config()?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::BrowserError(format!("failed to launch Chromium: {}", e)))?;

        // The CDP handler must be polled for the browser to make progress
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    log::debug!("Chromium handler event error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let mut browser = browser;
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(AppError::BrowserError(format!("failed to open page: {}", e)));
            }
        };

        Ok(Box::new(ChromiumPage {
            browser: Mutex::new(browser),
            page,
            handler_task,
            selector_timeout: self.selector_timeout,
        }))
    }
}

pub struct ChromiumPage {
    browser: Mutex<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
    selector_timeout: Duration,
}

impl ChromiumPage {
    async fn evaluate<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T, AppError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| AppError::BrowserError(format!("JS execution failed: {}", e)))?;

        result
            .into_value()
            .map_err(|e| AppError::BrowserError(format!("failed to convert JS result: {}", e)))
    }

    async fn element(&self, selector: &str) -> Result<chromiumoxide::element::Element, AppError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|e| AppError::BrowserError(format!("No element found for selector {}: {}", selector, e)))
    }
}

/// Quotes a CSS selector as a JavaScript string literal.
fn js_string(value: &str) -> Result<String, AppError> {
    serde_json::to_string(value)
        .map_err(|e| AppError::BrowserError(format!("invalid selector {}: {}", value, e)))
}

#[async_trait]
impl PortalPage for ChromiumPage {
    async fn goto(&self, url: &str) -> Result<(), AppError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| AppError::BrowserError(format!("navigation to {} failed: {}", url, e)))?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str) -> Result<(), AppError> {
        let start = Instant::now();
        loop {
            // Lookups fail while a navigation is in progress, keep polling
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if start.elapsed() >= self.selector_timeout {
                return Err(AppError::BrowserError(format!(
                    "Waiting for selector `{}` failed: {}ms exceeded",
                    selector,
                    self.selector_timeout.as_millis()
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<(), AppError> {
        let element = self.element(selector).await?;
        element
            .click()
            .await
            .map_err(|e| AppError::BrowserError(format!("failed to focus {}: {}", selector, e)))?;
        element
            .type_str(text)
            .await
            .map_err(|e| AppError::BrowserError(format!("failed to type into {}: {}", selector, e)))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), AppError> {
        self.element(selector)
            .await?
            .click()
            .await
            .map_err(|e| AppError::BrowserError(format!("failed to click {}: {}", selector, e)))?;
        Ok(())
    }

    async fn text_content(&self, selector: &str) -> Result<String, AppError> {
        let script = format!("document.querySelector({}).textContent", js_string(selector)?);
        self.evaluate(script).await
    }

    async fn table_rows(
        &self,
        row_selector: &str,
        cell_selector: &str,
    ) -> Result<Vec<Vec<String>>, AppError> {
        let script = format!(
            "Array.from(document.querySelectorAll({}), row => \
             Array.from(row.querySelectorAll({}), cell => cell.innerText.trim()))",
            js_string(row_selector)?,
            js_string(cell_selector)?
        );
        self.evaluate(script).await
    }

    async fn close(self: Box<Self>) -> Result<(), AppError> {
        let ChromiumPage {
            browser,
            page,
            handler_task,
            ..
        } = *self;
        drop(page);

        let mut browser = browser.into_inner();
        let closed = browser.close().await;
        let _ = browser.wait().await;
        handler_task.abort();

        closed
            .map(|_| ())
            .map_err(|e| AppError::BrowserError(format!("failed to close browser: {}", e)))
    }
}
