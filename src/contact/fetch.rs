//! Page acquisition strategies for the contact crawl.

use crate::core::config::Config;
use crate::core::error::Result;
use crate::transport::{BrowserSession, RetryingClient};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

/// Which frontier slot a fetch serves. The homepage is the one page every
/// crawl visits and gets the full request timeout; the speculative contact
/// paths get a shorter one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Homepage,
    ContactPath,
}

/// Fetches one page's markup. The crawl only ever needs text back; how it
/// gets rendered is the strategy's business.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, kind: FetchKind) -> Result<String>;
}

/// Scripted-browser fetch: executes page scripts, lets the page settle, and
/// nudges lazily-loaded content with a half-page scroll before capturing
/// the DOM.
pub struct RenderFetcher {
    session: BrowserSession,
    settle_delay: Duration,
}

impl RenderFetcher {
    pub fn new(session: BrowserSession, config: &Config) -> Self {
        Self {
            session,
            settle_delay: config.settle_delay,
        }
    }
}

#[async_trait]
impl PageFetcher for RenderFetcher {
    async fn fetch(&self, url: &Url, _kind: FetchKind) -> Result<String> {
        self.session.goto(url).await?;
        sleep(self.settle_delay).await;
        self.session.scroll_half_page().await?;
        sleep(self.settle_delay).await;
        self.session.page_source().await
    }
}

/// Plain HTTP fetch with the shared retry policy. Sees only server-rendered
/// markup, which is why it is the fallback rather than the default.
pub struct HttpFetcher {
    client: RetryingClient,
    homepage_timeout: Duration,
    path_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: RetryingClient::new(config)?,
            homepage_timeout: config.request_timeout,
            path_timeout: config.contact_page_timeout,
        })
    }

    fn timeout_for(&self, kind: FetchKind) -> Duration {
        match kind {
            FetchKind::Homepage => self.homepage_timeout,
            FetchKind::ContactPath => self.path_timeout,
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, kind: FetchKind) -> Result<String> {
        self.client.get_text(url, self.timeout_for(kind)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homepage_gets_the_full_request_timeout() {
        let config = Config {
            request_timeout: Duration::from_secs(10),
            contact_page_timeout: Duration::from_secs(5),
            ..Config::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();
        assert_eq!(
            fetcher.timeout_for(FetchKind::Homepage),
            Duration::from_secs(10)
        );
        assert_eq!(
            fetcher.timeout_for(FetchKind::ContactPath),
            Duration::from_secs(5)
        );
    }
}
