//! Handles loading configuration from files and applying it to the Config struct.

use super::{Config, ConfigFile};
use anyhow::Context;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Loads configuration settings from a TOML file.
/// Internal to the builder logic.
pub(crate) fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!(
            "File not found or is not a file: {}",
            file_path
        ));
    }
    tracing::debug!("Attempting to read config file: {}", file_path);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    let config_file_content: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::debug!("Successfully parsed configuration file: {}", file_path);
    Ok(config_file_content)
}

/// Applies settings from a parsed `ConfigFile` onto a mutable `Config`.
/// Internal helper for the builder. This merges settings.
pub(crate) fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    // Network
    if let Some(ref user_agent) = file_config.network.user_agent {
        config.user_agent = user_agent.clone();
    }
    if let Some(timeout) = file_config.network.request_timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }
    if let Some(timeout) = file_config.network.contact_page_timeout {
        config.contact_page_timeout = Duration::from_secs(timeout);
    }
    if let Some(attempts) = file_config.network.retry_attempts {
        config.retry_attempts = attempts;
    }
    if let Some(backoff) = file_config.network.retry_backoff_ms {
        config.retry_backoff = Duration::from_millis(backoff);
    }

    // Browser
    if let Some(ref url) = file_config.browser.webdriver_url {
        if !url.trim().is_empty() {
            config.webdriver_url = url.trim().to_string();
        }
    }
    if let Some(headless) = file_config.browser.headless {
        config.headless = headless;
    }
    if let Some(timeout) = file_config.browser.feed_timeout {
        config.feed_timeout = Duration::from_secs(timeout);
    }
    if let Some(delay) = file_config.browser.settle_delay {
        config.settle_delay = Duration::from_secs(delay);
    }
    if let Some(delay) = file_config.browser.page_load_delay {
        config.page_load_delay = Duration::from_secs(delay);
    }
    if let Some(attempts) = file_config.browser.scroll_max_attempts {
        config.scroll_max_attempts = attempts;
    }

    // Crawl
    if let Some(strategy) = file_config.crawl.fetch_strategy {
        config.fetch_strategy = strategy;
    }
    if let Some(ref paths) = file_config.crawl.contact_paths {
        if !paths.is_empty() {
            config.contact_paths = paths.clone();
        }
    }
    if let Some(verify) = file_config.crawl.verify_emails {
        config.verify_emails = verify;
    }
    if let Some(ref domains) = file_config.crawl.excluded_email_domains {
        if !domains.is_empty() {
            config.excluded_email_domains = domains.clone();
        }
    }

    // DNS
    if let Some(ref servers) = file_config.dns.dns_servers {
        if !servers.is_empty() {
            config.dns_servers = servers.clone();
        }
    }
    if let Some(timeout) = file_config.dns.dns_timeout {
        config.dns_timeout = Duration::from_secs(timeout);
    }

    // SMTP
    if let Some(ref sender) = file_config.smtp.smtp_sender_email {
        config.smtp_sender_email = sender.clone();
    }
    if let Some(timeout) = file_config.smtp.smtp_timeout {
        config.smtp_timeout = Duration::from_secs(timeout);
    }

    // Pipeline
    if let Some(max) = file_config.pipeline.max_results {
        config.max_results = max;
    }
    if let Some(delay) = file_config.pipeline.record_delay {
        config.record_delay = Duration::from_secs_f64(delay.max(0.0));
    }
    if let Some(ref column) = file_config.pipeline.website_column {
        config.website_column = column.clone();
    }
    if let Some(interval) = file_config.pipeline.listing_checkpoint_interval {
        config.listing_checkpoint_interval = interval;
    }
    if let Some(interval) = file_config.pipeline.contact_checkpoint_interval {
        config.contact_checkpoint_interval = interval;
    }
    if let Some(ref username) = file_config.pipeline.geonames_username {
        if !username.trim().is_empty() {
            config.geonames_username = Some(username.trim().to_string());
        }
    }
}
