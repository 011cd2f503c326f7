//! Listing discovery: scripted-browser pagination of a map-search results
//! feed and per-item detail extraction.

pub mod extract;

use crate::core::config::Config;
use crate::core::models::{BusinessRecord, SearchTarget};
use crate::transport::BrowserSession;
use async_trait::async_trait;
use extract::{DetailPanelExtractor, MapsPanelExtractor};
use fantoccini::elements::Element;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const FEED_SELECTOR: &str = "div[role='feed']";
const ITEM_SELECTOR: &str = "div[role='feed'] > div > div[jsaction]";

/// Drives one results feed to exhaustion (or the scroll cap) and extracts a
/// record per listing item.
pub struct ListingEngine {
    config: Config,
    extractor: Box<dyn DetailPanelExtractor>,
}

impl ListingEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            extractor: Box::new(MapsPanelExtractor::new()),
        }
    }

    /// Collects up to `target.max_results()` records from one search URL.
    ///
    /// Never fails the run: a dead feed yields an empty batch, a mid-batch
    /// failure yields whatever was collected before it, and individual item
    /// failures are skipped.
    pub async fn discover(
        &self,
        session: &BrowserSession,
        target: &SearchTarget,
    ) -> Vec<BusinessRecord> {
        let mut records = Vec::new();
        if let Err(e) = self.collect(session, target, &mut records).await {
            tracing::warn!(target: "listing_task",
                "Listing discovery aborted for {} after {} record(s): {}",
                target.url(), records.len(), e);
        }
        records
    }

    async fn collect(
        &self,
        session: &BrowserSession,
        target: &SearchTarget,
        records: &mut Vec<BusinessRecord>,
    ) -> crate::core::error::Result<()> {
        tracing::info!(target: "listing_task", "Opening results feed: {}", target.url());
        session.goto(target.url()).await?;
        sleep(self.config.page_load_delay).await;

        let feed = match session
            .wait_for_css(FEED_SELECTOR, self.config.feed_timeout)
            .await
        {
            Ok(feed) => feed,
            Err(e) => {
                tracing::warn!(target: "listing_task",
                    "No results feed rendered for {}: {}", target.url(), e);
                return Ok(());
            }
        };

        self.scroll_to_exhaustion(session, &feed).await?;

        let items = session.find_all_css(ITEM_SELECTOR).await?;
        tracing::info!(target: "listing_task",
            "Feed settled with {} item(s); extracting up to {}.",
            items.len(), target.max_results());

        let source = PanelItemSource {
            session,
            items,
            extractor: self.extractor.as_ref(),
            settle_delay: self.config.settle_delay,
        };
        collect_capped(&source, target.max_results(), records).await;
        Ok(())
    }

    /// Scrolls the feed until its content height stops growing or the
    /// attempt cap is reached.
    async fn scroll_to_exhaustion(
        &self,
        session: &BrowserSession,
        feed: &Element,
    ) -> crate::core::error::Result<()> {
        let mut tracker = ScrollTracker::new(self.config.scroll_max_attempts);
        let mut last_height = session.scroll_height(feed).await?;

        loop {
            session.scroll_to_bottom(feed).await?;
            let new_height = self.wait_for_growth(session, feed, last_height).await?;
            if !tracker.keep_scrolling(last_height, new_height) {
                tracing::debug!(target: "listing_task",
                    "Feed pagination stopped after {} scroll(s) at height {}.",
                    tracker.attempts(), new_height);
                return Ok(());
            }
            last_height = new_height;
        }
    }

    /// Polls the feed height until it differs from `last_height` or the
    /// growth window expires; returns the final observed height either way.
    async fn wait_for_growth(
        &self,
        session: &BrowserSession,
        feed: &Element,
        last_height: u64,
    ) -> crate::core::error::Result<u64> {
        let deadline = Instant::now() + self.config.scroll_growth_timeout;
        loop {
            let height = session.scroll_height(feed).await?;
            if height != last_height || Instant::now() >= deadline {
                return Ok(height);
            }
            sleep(self.config.scroll_poll_interval.min(remaining(deadline))).await;
        }
    }
}

fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

/// Ordered access to a settled feed's loadable items. The item loop only
/// sees this, keeping cap and skip semantics independent of the browser.
#[async_trait]
trait ItemSource: Send + Sync {
    fn len(&self) -> usize;
    /// Opens item `index` and extracts its record. Errors mean the item
    /// could not be opened; extraction itself degrades per field instead.
    async fn load(&self, index: usize) -> crate::core::error::Result<BusinessRecord>;
}

struct PanelItemSource<'a> {
    session: &'a BrowserSession,
    items: Vec<Element>,
    extractor: &'a dyn DetailPanelExtractor,
    settle_delay: Duration,
}

#[async_trait]
impl ItemSource for PanelItemSource<'_> {
    fn len(&self) -> usize {
        self.items.len()
    }

    async fn load(&self, index: usize) -> crate::core::error::Result<BusinessRecord> {
        self.items[index].click().await?;
        sleep(self.settle_delay).await;
        Ok(self.extractor.extract(self.session).await)
    }
}

/// Walks the first `max_results` items in feed order, appending one record
/// per loadable item. An item that fails to open is logged and skipped; it
/// does not pull a later item into the cap window.
async fn collect_capped(
    source: &dyn ItemSource,
    max_results: usize,
    records: &mut Vec<BusinessRecord>,
) {
    for index in (0..source.len()).take(max_results) {
        match source.load(index).await {
            Ok(record) => {
                tracing::info!(target: "listing_task",
                    "Scraped [{}]: {}", index + 1, record.name);
                records.push(record);
            }
            Err(e) => {
                tracing::warn!(target: "listing_task",
                    "Skipping item {}: {}", index + 1, e);
            }
        }
    }
}

/// Pure pagination-termination state: stop on an unchanged height or on the
/// attempt cap, whichever comes first.
struct ScrollTracker {
    attempts: u32,
    max_attempts: u32,
}

impl ScrollTracker {
    fn new(max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
        }
    }

    /// Records one completed scroll and decides whether another is allowed.
    fn keep_scrolling(&mut self, previous_height: u64, current_height: u64) -> bool {
        self.attempts += 1;
        if current_height == previous_height {
            return false;
        }
        self.attempts < self.max_attempts
    }

    fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use crate::core::models::NOT_AVAILABLE;

    struct ScriptedItems {
        outcomes: Vec<crate::core::error::Result<BusinessRecord>>,
    }

    fn named(name: &str) -> BusinessRecord {
        BusinessRecord {
            name: name.to_string(),
            ..BusinessRecord::default()
        }
    }

    #[async_trait]
    impl ItemSource for ScriptedItems {
        fn len(&self) -> usize {
            self.outcomes.len()
        }

        async fn load(&self, index: usize) -> crate::core::error::Result<BusinessRecord> {
            match &self.outcomes[index] {
                Ok(record) => Ok(record.clone()),
                Err(_) => Err(AppError::RenderTimeout(format!("item {} unopenable", index))),
            }
        }
    }

    #[tokio::test]
    async fn cap_takes_exactly_max_results_in_feed_order() {
        let source = ScriptedItems {
            outcomes: ["Alpha", "Bravo", "Charlie", "Delta", "Echo"]
                .iter()
                .map(|n| Ok(named(n)))
                .collect(),
        };
        let mut records = Vec::new();
        collect_capped(&source, 3, &mut records).await;

        assert_eq!(records.len(), 3);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Bravo", "Charlie"]);
        // Every field is populated, with the sentinel standing in for the
        // ones the detail panel did not yield.
        for record in &records {
            assert!(!record.name.is_empty());
            assert_eq!(record.phone, NOT_AVAILABLE);
            assert_eq!(record.category, NOT_AVAILABLE);
        }
    }

    #[tokio::test]
    async fn unopenable_item_is_skipped_without_widening_the_cap() {
        let source = ScriptedItems {
            outcomes: vec![
                Ok(named("Alpha")),
                Err(AppError::Input("stale".to_string())),
                Ok(named("Charlie")),
                Ok(named("Delta")),
            ],
        };
        let mut records = Vec::new();
        collect_capped(&source, 3, &mut records).await;

        // Item 2 failed inside the cap window; Delta does not replace it.
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Charlie"]);
    }

    #[tokio::test]
    async fn short_feed_yields_everything_it_has() {
        let source = ScriptedItems {
            outcomes: vec![Ok(named("Alpha")), Ok(named("Bravo"))],
        };
        let mut records = Vec::new();
        collect_capped(&source, 20, &mut records).await;
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn stops_when_height_stops_growing() {
        let mut tracker = ScrollTracker::new(10);
        assert!(tracker.keep_scrolling(1000, 2000));
        assert!(tracker.keep_scrolling(2000, 3000));
        assert!(!tracker.keep_scrolling(3000, 3000));
        assert_eq!(tracker.attempts(), 3);
    }

    #[test]
    fn stops_at_attempt_cap_even_if_growing() {
        let mut tracker = ScrollTracker::new(10);
        let mut height = 1000;
        let mut scrolls = 0;
        loop {
            scrolls += 1;
            let next = height + 500;
            if !tracker.keep_scrolling(height, next) {
                break;
            }
            height = next;
        }
        assert_eq!(scrolls, 10);
    }

    #[test]
    fn single_page_feed_stops_immediately() {
        let mut tracker = ScrollTracker::new(10);
        assert!(!tracker.keep_scrolling(1200, 1200));
        assert_eq!(tracker.attempts(), 1);
    }
}
