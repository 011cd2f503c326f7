//! Provides the `ConfigBuilder` for fluent configuration construction.

use super::loading::{apply_file_config, load_config_file};
use super::validation::validate_config;
use super::{Config, ConfigFile, FetchStrategy};
use crate::core::error::{AppError, Result};
use std::path::Path;
use std::time::Duration;

/// Builder pattern for creating `Config` instances fluently.
///
/// Handles loading from files, applying overrides, and validation.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    config_file_path: Option<String>,
    overrides: ConfigFile,
}

impl ConfigBuilder {
    /// Creates a new builder with default configuration values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify an optional configuration file path to load.
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    pub fn max_results(mut self, value: usize) -> Self {
        self.overrides.pipeline.max_results = Some(value);
        self
    }
    pub fn record_delay(mut self, duration: Duration) -> Self {
        self.overrides.pipeline.record_delay = Some(duration.as_secs_f64());
        self
    }
    pub fn website_column(mut self, value: impl Into<String>) -> Self {
        self.overrides.pipeline.website_column = Some(value.into());
        self
    }
    pub fn geonames_username(mut self, value: Option<impl Into<String>>) -> Self {
        self.overrides.pipeline.geonames_username = value.map(|s| s.into());
        self
    }
    pub fn listing_checkpoint_interval(mut self, value: usize) -> Self {
        self.overrides.pipeline.listing_checkpoint_interval = Some(value);
        self
    }
    pub fn contact_checkpoint_interval(mut self, value: usize) -> Self {
        self.overrides.pipeline.contact_checkpoint_interval = Some(value);
        self
    }
    pub fn fetch_strategy(mut self, value: FetchStrategy) -> Self {
        self.overrides.crawl.fetch_strategy = Some(value);
        self
    }
    pub fn verify_emails(mut self, enable: bool) -> Self {
        self.overrides.crawl.verify_emails = Some(enable);
        self
    }
    pub fn contact_paths(mut self, paths: Vec<String>) -> Self {
        self.overrides.crawl.contact_paths = Some(paths);
        self
    }
    pub fn webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.browser.webdriver_url = Some(url.into());
        self
    }
    pub fn headless(mut self, enable: bool) -> Self {
        self.overrides.browser.headless = Some(enable);
        self
    }
    pub fn scroll_max_attempts(mut self, value: u32) -> Self {
        self.overrides.browser.scroll_max_attempts = Some(value);
        self
    }
    pub fn settle_delay(mut self, duration: Duration) -> Self {
        self.overrides.browser.settle_delay = Some(duration.as_secs());
        self
    }
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.overrides.network.user_agent = Some(value.into());
        self
    }
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.overrides.network.request_timeout = Some(duration.as_secs());
        self
    }
    pub fn smtp_sender_email(mut self, value: impl Into<String>) -> Self {
        self.overrides.smtp.smtp_sender_email = Some(value.into());
        self
    }
    pub fn smtp_timeout(mut self, duration: Duration) -> Self {
        self.overrides.smtp.smtp_timeout = Some(duration.as_secs());
        self
    }
    pub fn dns_timeout(mut self, duration: Duration) -> Self {
        self.overrides.dns.dns_timeout = Some(duration.as_secs());
        self
    }
    pub fn dns_servers(mut self, servers: Vec<String>) -> Self {
        self.overrides.dns.dns_servers = Some(servers);
        self
    }

    /// Builds the final `Config`, applying defaults, file settings,
    /// overrides, and validation.
    pub fn build(mut self) -> Result<Config> {
        let mut loaded_path: Option<String> = None;

        if let Some(ref path) = self.config_file_path {
            match load_config_file(path) {
                Ok(file_config) => {
                    apply_file_config(&mut self.config, &file_config);
                    loaded_path = Some(path.clone());
                    tracing::info!("Loaded base configuration from specified file: {}", path);
                }
                Err(e) => {
                    tracing::error!("Failed to load specified config file '{}': {}", path, e);
                    return Err(AppError::Config(format!(
                        "Failed to load specified configuration file '{}': {}",
                        path, e
                    )));
                }
            }
        } else {
            tracing::debug!("No config file specified, checking default locations.");
            for path_str in ["./leadscout.toml", "./config.toml"] {
                if Path::new(path_str).exists() {
                    match load_config_file(path_str) {
                        Ok(file_config) => {
                            apply_file_config(&mut self.config, &file_config);
                            loaded_path = Some(path_str.to_string());
                            tracing::info!(
                                "Loaded base configuration from default location: {}",
                                path_str
                            );
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Failed to load or parse default config '{}': {}",
                                path_str,
                                e
                            );
                        }
                    }
                }
            }
            if loaded_path.is_none() {
                tracing::debug!("No configuration file found. Using defaults and overrides.");
            }
        }

        apply_file_config(&mut self.config, &self.overrides);
        self.config.loaded_config_path = loaded_path;
        validate_config(&mut self.config)?;

        tracing::debug!("Final configuration built successfully.");
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_defaults() {
        let config = ConfigBuilder::new()
            .max_results(3)
            .verify_emails(false)
            .fetch_strategy(FetchStrategy::Http)
            .record_delay(Duration::from_millis(1500))
            .build()
            .unwrap();
        assert_eq!(config.max_results, 3);
        assert!(!config.verify_emails);
        assert_eq!(config.fetch_strategy, FetchStrategy::Http);
        assert_eq!(config.record_delay, Duration::from_millis(1500));
        // Untouched defaults survive.
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.scroll_max_attempts, 10);
    }

    #[test]
    fn invalid_sender_is_rejected() {
        let err = ConfigBuilder::new()
            .smtp_sender_email("not-an-address")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("sender"));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(ConfigBuilder::new()
            .config_file("/definitely/not/here.toml")
            .build()
            .is_err());
    }
}
