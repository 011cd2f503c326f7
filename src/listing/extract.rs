//! Field extraction from an opened listing detail panel.
//!
//! The lookups are coupled to a specific, volatile markup version, so they
//! live behind the [`DetailPanelExtractor`] capability: pagination and the
//! item loop never see a selector.

use crate::core::models::{field_or_sentinel, BusinessRecord};
use crate::transport::BrowserSession;
use async_trait::async_trait;
use fantoccini::Locator;
use regex::Regex;

/// Extracts one [`BusinessRecord`] from the currently opened detail panel.
///
/// Implementations must degrade per field: a lookup miss yields the sentinel
/// for that field only and never fails the record.
#[async_trait]
pub trait DetailPanelExtractor: Send + Sync {
    async fn extract(&self, session: &BrowserSession) -> BusinessRecord;
}

/// Extractor for the current map-search detail panel markup.
pub struct MapsPanelExtractor {
    rating_re: Regex,
    reviews_re: Regex,
    phone_re: Regex,
}

const NAME_SELECTOR: &str = "h1.DUwDvf";
const STARS_SELECTOR: &str = "div.F7nice span[aria-label*='star']";
const PHONE_SELECTOR: &str = "button[data-item-id*='phone']";
const WEBSITE_SELECTOR: &str = "a[data-item-id*='authority']";
const ADDRESS_SELECTOR: &str = "button[data-item-id*='address']";
const CATEGORY_SELECTOR: &str = "button.DkEaL";

impl MapsPanelExtractor {
    pub fn new() -> Self {
        Self {
            rating_re: Regex::new(r"(\d+\.?\d*)\s*star").expect("rating regex is valid"),
            reviews_re: Regex::new(r"\(?([\d,]+)\)?").expect("reviews regex is valid"),
            phone_re: Regex::new(r"phone:tel:(.+)").expect("phone regex is valid"),
        }
    }

    /// "4.5 stars" -> "4.5"
    fn parse_rating(&self, aria_label: &str) -> Option<String> {
        self.rating_re
            .captures(aria_label)
            .map(|c| c[1].to_string())
    }

    /// "(1,234)" or "1234 reviews" -> "1234"; thousands separators stripped.
    fn parse_review_count(&self, text: &str) -> Option<String> {
        self.reviews_re
            .captures(text)
            .map(|c| c[1].replace(',', ""))
    }

    /// "phone:tel:+12085551234" -> "+12085551234"
    fn parse_phone_item(&self, data_item_id: &str) -> Option<String> {
        self.phone_re
            .captures(data_item_id)
            .map(|c| c[1].to_string())
    }

    /// "Address: 123 Main St" -> "123 Main St"
    fn strip_address_label(aria_label: &str) -> String {
        aria_label
            .strip_prefix("Address: ")
            .unwrap_or(aria_label)
            .to_string()
    }

    async fn lookup_name(&self, session: &BrowserSession) -> Option<String> {
        let element = session.find_css(NAME_SELECTOR).await.ok()?;
        element.text().await.ok()
    }

    async fn lookup_rating(&self, session: &BrowserSession) -> Option<String> {
        let element = session.find_css(STARS_SELECTOR).await.ok()?;
        let label = element.attr("aria-label").await.ok()??;
        self.parse_rating(&label)
    }

    /// The review count sits in the star label's parent element text.
    async fn lookup_reviews(&self, session: &BrowserSession) -> Option<String> {
        let element = session.find_css(STARS_SELECTOR).await.ok()?;
        let parent = element.find(Locator::XPath("./parent::*")).await.ok()?;
        let text = parent.text().await.ok()?;
        self.parse_review_count(&text)
    }

    async fn lookup_phone(&self, session: &BrowserSession) -> Option<String> {
        let element = session.find_css(PHONE_SELECTOR).await.ok()?;
        if let Ok(Some(item_id)) = element.attr("data-item-id").await {
            if let Some(phone) = self.parse_phone_item(&item_id) {
                return Some(phone);
            }
        }
        // Structured attribute missing the number: fall back to visible text.
        element.text().await.ok()
    }

    async fn lookup_website(&self, session: &BrowserSession) -> Option<String> {
        let element = session.find_css(WEBSITE_SELECTOR).await.ok()?;
        element.attr("href").await.ok()?
    }

    async fn lookup_address(&self, session: &BrowserSession) -> Option<String> {
        let element = session.find_css(ADDRESS_SELECTOR).await.ok()?;
        let label = element.attr("aria-label").await.ok()??;
        Some(Self::strip_address_label(&label))
    }

    async fn lookup_category(&self, session: &BrowserSession) -> Option<String> {
        let element = session.find_css(CATEGORY_SELECTOR).await.ok()?;
        element.text().await.ok()
    }
}

impl Default for MapsPanelExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DetailPanelExtractor for MapsPanelExtractor {
    async fn extract(&self, session: &BrowserSession) -> BusinessRecord {
        BusinessRecord {
            name: field_or_sentinel(self.lookup_name(session).await),
            phone: field_or_sentinel(self.lookup_phone(session).await),
            website: field_or_sentinel(self.lookup_website(session).await),
            rating: field_or_sentinel(self.lookup_rating(session).await),
            reviews: field_or_sentinel(self.lookup_reviews(session).await),
            address: field_or_sentinel(self.lookup_address(session).await),
            category: field_or_sentinel(self.lookup_category(session).await),
            email: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_parsing() {
        let ex = MapsPanelExtractor::new();
        assert_eq!(ex.parse_rating("4.5 stars"), Some("4.5".to_string()));
        assert_eq!(ex.parse_rating("5 star rating"), Some("5".to_string()));
        assert_eq!(ex.parse_rating("no rating here"), None);
    }

    #[test]
    fn review_count_parsing_strips_separators() {
        let ex = MapsPanelExtractor::new();
        assert_eq!(ex.parse_review_count("(1,234)"), Some("1234".to_string()));
        assert_eq!(ex.parse_review_count("4.5 (89)"), Some("4".to_string()));
        assert_eq!(ex.parse_review_count("321 reviews"), Some("321".to_string()));
        assert_eq!(ex.parse_review_count("no digits"), None);
    }

    #[test]
    fn phone_item_parsing_with_fallback_shape() {
        let ex = MapsPanelExtractor::new();
        assert_eq!(
            ex.parse_phone_item("phone:tel:+12085551234"),
            Some("+12085551234".to_string())
        );
        assert_eq!(ex.parse_phone_item("authority"), None);
    }

    #[test]
    fn address_label_stripping() {
        assert_eq!(
            MapsPanelExtractor::strip_address_label("Address: 123 Main St, Boise, ID"),
            "123 Main St, Boise, ID"
        );
        assert_eq!(
            MapsPanelExtractor::strip_address_label("123 Main St"),
            "123 Main St"
        );
    }
}
