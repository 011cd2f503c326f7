//! Contains validation logic for the final Config struct.

use super::{Config, FetchStrategy};
use crate::core::error::{AppError, Result};

/// Validates the configuration after loading and overrides.
/// Clamps values where a sane default exists and errors where it does not.
/// Internal helper for the builder's `build` method.
pub(crate) fn validate_config(config: &mut Config) -> Result<()> {
    if config.max_results == 0 {
        return Err(AppError::Config(
            "max_results must be a positive integer.".to_string(),
        ));
    }
    if config.retry_attempts == 0 {
        tracing::warn!("retry_attempts was set to 0. Setting to 1.");
        config.retry_attempts = 1;
    }
    if config.scroll_max_attempts == 0 {
        tracing::warn!("scroll_max_attempts was set to 0. Setting to 1.");
        config.scroll_max_attempts = 1;
    }
    if config.website_column.trim().is_empty() {
        return Err(AppError::Config(
            "website_column cannot be empty.".to_string(),
        ));
    }
    if !config.smtp_sender_email.contains('@') || !config.smtp_sender_email.contains('.') {
        return Err(AppError::Config(format!(
            "Invalid SMTP sender email format: {}",
            config.smtp_sender_email
        )));
    }
    if config.fetch_strategy == FetchStrategy::Render && config.webdriver_url.trim().is_empty() {
        return Err(AppError::Config(
            "A WebDriver URL is required when the render fetch strategy is selected.".to_string(),
        ));
    }
    if config.dns_servers.is_empty() {
        tracing::warn!("DNS servers list is empty. Resolver will use system defaults.");
    }
    if config.contact_paths.is_empty() {
        tracing::warn!("Contact path list is empty. Only homepages will be crawled.");
    }
    if config.listing_checkpoint_interval == 0 {
        tracing::warn!("listing_checkpoint_interval was 0. Setting to 1.");
        config.listing_checkpoint_interval = 1;
    }
    if config.contact_checkpoint_interval == 0 {
        tracing::warn!("contact_checkpoint_interval was 0. Setting to 1.");
        config.contact_checkpoint_interval = 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_counters_are_clamped() {
        let mut config = Config {
            retry_attempts: 0,
            scroll_max_attempts: 0,
            listing_checkpoint_interval: 0,
            ..Config::default()
        };
        validate_config(&mut config).unwrap();
        assert_eq!(config.retry_attempts, 1);
        assert_eq!(config.scroll_max_attempts, 1);
        assert_eq!(config.listing_checkpoint_interval, 1);
    }

    #[test]
    fn render_strategy_requires_webdriver_url() {
        let mut config = Config {
            webdriver_url: "  ".to_string(),
            ..Config::default()
        };
        assert!(validate_config(&mut config).is_err());
        config.fetch_strategy = FetchStrategy::Http;
        // Listing discovery still needs a browser, but the config itself is
        // usable for a pure-HTTP contact run.
        assert!(validate_config(&mut config).is_ok());
    }

    #[test]
    fn zero_max_results_is_fatal() {
        let mut config = Config {
            max_results: 0,
            ..Config::default()
        };
        assert!(validate_config(&mut config).is_err());
    }
}
