//! Core data structures shared across the pipeline.

use crate::core::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Sentinel used for every field whose value could not be determined.
/// Fields are never empty strings and never null in tabular output.
pub const NOT_AVAILABLE: &str = "N/A";

/// A single map-search page to paginate, plus a cap on extracted items.
#[derive(Debug, Clone)]
pub struct SearchTarget {
    url: Url,
    max_results: usize,
}

impl SearchTarget {
    /// Creates a target. `max_results` must be positive.
    pub fn new(url: Url, max_results: usize) -> Result<Self> {
        if max_results == 0 {
            return Err(AppError::Input(
                "max_results must be a positive integer".to_string(),
            ));
        }
        Ok(Self { url, max_results })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }
}

/// One business listing extracted from the results feed.
///
/// Every field is independently optional; absence is represented by the
/// [`NOT_AVAILABLE`] sentinel. `email` is filled in by the contact discovery
/// stage and only appears in the enriched output table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusinessRecord {
    pub name: String,
    pub phone: String,
    pub website: String,
    pub rating: String,
    pub reviews: String,
    pub address: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Default for BusinessRecord {
    fn default() -> Self {
        Self {
            name: NOT_AVAILABLE.to_string(),
            phone: NOT_AVAILABLE.to_string(),
            website: NOT_AVAILABLE.to_string(),
            rating: NOT_AVAILABLE.to_string(),
            reviews: NOT_AVAILABLE.to_string(),
            address: NOT_AVAILABLE.to_string(),
            category: NOT_AVAILABLE.to_string(),
            email: None,
        }
    }
}

impl BusinessRecord {
    /// True when the record carries a website worth crawling.
    pub fn has_website(&self) -> bool {
        let w = self.website.trim();
        !w.is_empty() && w != NOT_AVAILABLE
    }
}

/// Converts an extraction result into a field value, degrading to the
/// sentinel on a miss. A miss never carries real text.
pub fn field_or_sentinel(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Geographic scope for search-target generation.
#[derive(Debug, Clone)]
pub enum GeoScope {
    City {
        city: String,
        state: String,
        country: String,
    },
    ZipCodes {
        city: String,
        state: String,
        country: String,
        zips: Vec<String>,
    },
    Coordinates {
        city: String,
        state: String,
        country: String,
        latitude: f64,
        longitude: f64,
    },
}

/// Summary emitted after the contact discovery stage.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentStats {
    pub total_businesses: usize,
    pub websites_scraped: usize,
    pub emails_found: usize,
    pub no_email: usize,
    pub errors: usize,
    pub success_rate: f64,
}

impl EnrichmentStats {
    pub fn finish(&mut self) {
        self.no_email = self.websites_scraped.saturating_sub(self.emails_found);
        self.success_rate = if self.websites_scraped > 0 {
            (self.emails_found as f64 / self.websites_scraped as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };
    }
}

/// The single structured result object emitted as the final line of the
/// primary output channel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub success: bool,
    pub count: usize,
    pub file: String,
    pub preview: Vec<BusinessRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<EnrichmentStats>,
}

impl RunReport {
    pub fn new(records: &[BusinessRecord], file: &str, stats: Option<EnrichmentStats>) -> Self {
        Self {
            success: true,
            count: records.len(),
            file: file.to_string(),
            preview: records.iter().take(10).cloned().collect(),
            stats,
        }
    }
}

/// Structured error object written to the primary channel before a
/// non-zero exit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub success: bool,
    pub error: String,
}

impl ErrorReport {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_target_rejects_zero_cap() {
        let url = Url::parse("https://www.google.com/maps/search/plumbers").unwrap();
        assert!(SearchTarget::new(url.clone(), 0).is_err());
        assert_eq!(SearchTarget::new(url, 3).unwrap().max_results(), 3);
    }

    #[test]
    fn default_record_uses_sentinel_everywhere() {
        let record = BusinessRecord::default();
        assert_eq!(record.name, NOT_AVAILABLE);
        assert_eq!(record.reviews, NOT_AVAILABLE);
        assert!(!record.has_website());
        assert!(record.email.is_none());
    }

    #[test]
    fn field_or_sentinel_never_yields_empty() {
        assert_eq!(field_or_sentinel(None), NOT_AVAILABLE);
        assert_eq!(field_or_sentinel(Some("  ".to_string())), NOT_AVAILABLE);
        assert_eq!(field_or_sentinel(Some(" Joe's ".to_string())), "Joe's");
    }

    #[test]
    fn enrichment_stats_rates() {
        let mut stats = EnrichmentStats {
            total_businesses: 10,
            websites_scraped: 8,
            emails_found: 2,
            ..Default::default()
        };
        stats.finish();
        assert_eq!(stats.no_email, 6);
        assert_eq!(stats.success_rate, 25.0);
    }
}
