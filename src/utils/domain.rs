//! Utility functions for handling domain names and URLs.

use crate::core::error::{AppError, Result};
use url::Url;

/// Parses a website value into a navigable `Url`.
///
/// Prepends `https://` when the scheme is missing, which is the common shape
/// of website fields scraped from listing panels.
/// Returns `Err(AppError::Input)` for empty input and
/// `Err(AppError::UrlParse)` when the result still is not a URL with a host.
pub(crate) fn normalize_url(website: &str) -> Result<Url> {
    let trimmed_input = website.trim();
    if trimmed_input.is_empty() {
        tracing::warn!("Received empty input for URL normalization.");
        return Err(AppError::Input("Website URL input is empty".to_string()));
    }

    let url_str_with_scheme = if !trimmed_input.contains("://") {
        format!("https://{}", trimmed_input)
    } else {
        trimmed_input.to_string()
    };

    match Url::parse(&url_str_with_scheme) {
        Ok(url) => {
            if url.host_str().map_or(true, |h| h.is_empty()) {
                tracing::error!("URL normalization resulted in URL without host: {}", url);
                Err(AppError::UrlParse(url::ParseError::EmptyHost))
            } else {
                Ok(url)
            }
        }
        Err(e) => {
            tracing::error!(
                "Failed to parse normalized URL '{}' (original: '{}'): {}",
                url_str_with_scheme,
                trimmed_input,
                e
            );
            Err(AppError::UrlParse(e))
        }
    }
}

/// Extracts the registrable host (e.g. "acme.com") from an email address's
/// domain part, for MX resolution.
pub(crate) fn email_domain(email: &str) -> Result<String> {
    let domain = email
        .rsplit('@')
        .next()
        .filter(|d| d.contains('.') && !d.is_empty())
        .ok_or_else(|| {
            AppError::DomainExtraction(format!("No usable domain part in '{}'", email))
        })?;
    Ok(domain.trim_end_matches('.').to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_url_adds_scheme() {
        assert_eq!(
            normalize_url("example.com").unwrap().as_str(),
            "https://example.com/"
        );
        assert_eq!(
            normalize_url("http://example.com").unwrap().as_str(),
            "http://example.com/"
        );
        assert_eq!(
            normalize_url(" https://www.example.com/path ").unwrap().as_str(),
            "https://www.example.com/path"
        );
    }

    #[test]
    fn normalize_url_rejects_hostless_input() {
        assert!(normalize_url("").is_err());
        assert!(normalize_url("   ").is_err());
        assert!(normalize_url("http://").is_err());
        assert!(normalize_url("https://").is_err());
    }

    #[test]
    fn email_domain_extraction() {
        assert_eq!(email_domain("Info@Acme.COM").unwrap(), "acme.com");
        assert_eq!(email_domain("a@mail.acme.co.uk.").unwrap(), "mail.acme.co.uk");
        assert!(email_domain("no-at-sign").is_err());
        assert!(email_domain("user@nodot").is_err());
    }
}
