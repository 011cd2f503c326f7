//! Configuration for the leadscout pipeline.
//!
//! A [`Config`] is constructed once at startup through [`ConfigBuilder`]
//! (defaults, then an optional TOML file, then explicit overrides) and passed
//! to the engines. Nothing in the pipeline reads ambient state after that.

mod builder;
mod loading;
mod validation;

pub use builder::ConfigBuilder;

use crate::core::error::Result;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;

/// Which fetch strategy the contact discovery engine starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    /// Scripted browser session: executes page scripts, settle delay,
    /// half-page scroll. Falls back to `Http` if the session cannot start.
    Render,
    /// Plain HTTP fetch: faster, sees only server-rendered markup.
    Http,
}

/// Effective runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Network / HTTP
    pub user_agent: String,
    pub request_timeout: Duration,
    pub contact_page_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
    pub retryable_statuses: Vec<u16>,

    // Browser session
    pub webdriver_url: String,
    pub headless: bool,
    pub feed_timeout: Duration,
    pub settle_delay: Duration,
    pub page_load_delay: Duration,
    pub scroll_max_attempts: u32,
    pub scroll_poll_interval: Duration,
    pub scroll_growth_timeout: Duration,

    // Contact crawl
    pub fetch_strategy: FetchStrategy,
    pub contact_paths: Vec<String>,
    pub verify_emails: bool,
    pub excluded_email_domains: Vec<String>,
    pub asset_extensions: Vec<String>,
    pub email_regex: Regex,

    // DNS / SMTP verification
    pub dns_servers: Vec<String>,
    pub dns_timeout: Duration,
    pub smtp_sender_email: String,
    pub smtp_timeout: Duration,

    // Pipeline
    pub max_results: usize,
    pub record_delay: Duration,
    pub website_column: String,
    pub listing_checkpoint_interval: usize,
    pub contact_checkpoint_interval: usize,
    pub geonames_username: Option<String>,

    /// Which config file (if any) supplied the base values.
    pub loaded_config_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            request_timeout: Duration::from_secs(10),
            contact_page_timeout: Duration::from_secs(5),
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(300),
            retryable_statuses: vec![500, 502, 503, 504],

            webdriver_url: "http://localhost:4444".to_string(),
            headless: true,
            feed_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_secs(2),
            page_load_delay: Duration::from_secs(3),
            scroll_max_attempts: 10,
            scroll_poll_interval: Duration::from_millis(250),
            scroll_growth_timeout: Duration::from_secs(2),

            fetch_strategy: FetchStrategy::Render,
            contact_paths: [
                "/contact",
                "/contact-us",
                "/about",
                "/about-us",
                "/team",
                "/contact.html",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            verify_emails: true,
            excluded_email_domains: [
                "example.com",
                "example.org",
                "yourdomain.com",
                "yoursite.com",
                "email.com",
                "domain.com",
                "test.com",
                "sentry.io",
                "wixpress.com",
                "cloudflare.com",
                "schema.org",
                "w3.org",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            asset_extensions: [
                ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico", ".pdf", ".css", ".js",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            email_regex: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                .expect("email regex is valid"),

            dns_servers: vec![
                "8.8.8.8".to_string(),
                "8.8.4.4".to_string(),
                "1.1.1.1".to_string(),
            ],
            dns_timeout: Duration::from_secs(5),
            smtp_sender_email: "verify@example.com".to_string(),
            smtp_timeout: Duration::from_secs(10),

            max_results: 20,
            record_delay: Duration::from_secs(2),
            website_column: "website".to_string(),
            listing_checkpoint_interval: 5,
            contact_checkpoint_interval: 10,
            geonames_username: None,

            loaded_config_path: None,
        }
    }
}

/// Raw deserialized shape of a `leadscout.toml` file. Every field is
/// optional; present values overwrite defaults during the build.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub network: NetworkSection,
    pub browser: BrowserSection,
    pub crawl: CrawlSection,
    pub dns: DnsSection,
    pub smtp: SmtpSection,
    pub pipeline: PipelineSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    pub user_agent: Option<String>,
    pub request_timeout: Option<u64>,
    pub contact_page_timeout: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    pub webdriver_url: Option<String>,
    pub headless: Option<bool>,
    pub feed_timeout: Option<u64>,
    pub settle_delay: Option<u64>,
    pub page_load_delay: Option<u64>,
    pub scroll_max_attempts: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CrawlSection {
    pub fetch_strategy: Option<FetchStrategy>,
    pub contact_paths: Option<Vec<String>>,
    pub verify_emails: Option<bool>,
    pub excluded_email_domains: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DnsSection {
    pub dns_servers: Option<Vec<String>>,
    pub dns_timeout: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SmtpSection {
    pub smtp_sender_email: Option<String>,
    pub smtp_timeout: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub max_results: Option<usize>,
    pub record_delay: Option<f64>,
    pub website_column: Option<String>,
    pub listing_checkpoint_interval: Option<usize>,
    pub contact_checkpoint_interval: Option<usize>,
    pub geonames_username: Option<String>,
}
