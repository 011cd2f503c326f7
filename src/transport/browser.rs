//! Shared WebDriver session management.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::map::Map as JsonMap;
use std::time::Duration;
use url::Url;

/// A long-lived scripted browser session.
///
/// One session is acquired per pipeline invocation and shared by every
/// record (the underlying `fantoccini::Client` is a cheap handle clone).
/// It must be released through [`BrowserSession::close`] exactly once,
/// on every exit path.
#[derive(Clone)]
pub struct BrowserSession {
    client: Client,
}

impl BrowserSession {
    /// Connects to the WebDriver endpoint and opens a Chrome session.
    pub async fn connect(config: &Config) -> Result<Self> {
        tracing::debug!(target: "browser", "Connecting to WebDriver at {}...", config.webdriver_url);

        let mut caps = JsonMap::new();
        let mut chrome_opts = JsonMap::new();

        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--window-size=1920,1080".to_string(),
            "--disable-extensions".to_string(),
            "--disable-background-networking".to_string(),
            "--mute-audio".to_string(),
            format!("--user-agent={}", config.user_agent),
        ];
        if config.headless {
            args.insert(0, "--headless=new".to_string());
        }
        chrome_opts.insert("args".to_string(), serde_json::json!(args));

        caps.insert("browserName".to_string(), serde_json::json!("chrome"));
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!(chrome_opts),
        );

        let mut builder = ClientBuilder::native();
        builder.capabilities(caps);

        match builder.connect(&config.webdriver_url).await {
            Ok(client) => {
                tracing::info!(target: "browser", "WebDriver session established.");
                Ok(Self { client })
            }
            Err(e) => {
                tracing::error!(target: "browser",
                    "Failed to connect to WebDriver at {}: {}", config.webdriver_url, e);
                Err(e.into())
            }
        }
    }

    /// Navigates the session to `url`.
    pub async fn goto(&self, url: &Url) -> Result<()> {
        self.client.goto(url.as_str()).await?;
        Ok(())
    }

    /// Waits for the first element matching `selector`, bounded by `timeout`.
    /// Expiry is reported as [`AppError::RenderTimeout`].
    pub async fn wait_for_css(&self, selector: &str, timeout: Duration) -> Result<Element> {
        self.client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
            .map_err(|e| {
                AppError::RenderTimeout(format!(
                    "Element '{}' not present within {:?}: {}",
                    selector, timeout, e
                ))
            })
    }

    /// First element currently matching `selector`; errors if absent.
    pub async fn find_css(&self, selector: &str) -> Result<Element> {
        Ok(self.client.find(Locator::Css(selector)).await?)
    }

    /// All elements currently matching `selector`, in DOM order.
    pub async fn find_all_css(&self, selector: &str) -> Result<Vec<Element>> {
        Ok(self.client.find_all(Locator::Css(selector)).await?)
    }

    /// Current content height of a scrollable element.
    pub async fn scroll_height(&self, element: &Element) -> Result<u64> {
        let value = self
            .client
            .execute(
                "return arguments[0].scrollHeight;",
                vec![serde_json::to_value(element)?],
            )
            .await?;
        Ok(value.as_u64().unwrap_or(0))
    }

    /// Scrolls an element's viewport to its current bottom.
    pub async fn scroll_to_bottom(&self, element: &Element) -> Result<()> {
        self.client
            .execute(
                "arguments[0].scrollTop = arguments[0].scrollHeight;",
                vec![serde_json::to_value(element)?],
            )
            .await?;
        Ok(())
    }

    /// Scrolls the window halfway down the document, enough to trigger most
    /// lazily-loaded contact blocks without paging through everything.
    pub async fn scroll_half_page(&self) -> Result<()> {
        self.client
            .execute(
                "window.scrollTo(0, document.body.scrollHeight / 2);",
                vec![],
            )
            .await?;
        Ok(())
    }

    /// Full current page markup.
    pub async fn page_source(&self) -> Result<String> {
        Ok(self.client.source().await?)
    }

    /// Releases the session. Errors are logged, not propagated, so close
    /// can run unconditionally on error paths.
    pub async fn close(self) {
        tracing::debug!(target: "browser", "Closing WebDriver session...");
        if let Err(e) = self.client.close().await {
            tracing::warn!(target: "browser", "Failed to close WebDriver session cleanly: {}", e);
        }
    }
}
