//! Email candidate extraction and plausibility filtering.
//!
//! Candidates come out of raw page text, so the filters here carry the real
//! weight: they throw away documentation placeholders, infrastructure noise
//! and asset filenames that happen to match the address shape.

use crate::core::config::Config;
use std::collections::BTreeSet;

/// Scans raw page markup for address-shaped strings and returns the
/// plausible ones, lowercased and deduplicated.
pub(crate) fn extract_candidates(config: &Config, body: &str) -> BTreeSet<String> {
    config
        .email_regex
        .find_iter(body)
        .map(|m| m.as_str().to_lowercase())
        .filter(|candidate| is_plausible(config, candidate))
        .collect()
}

/// Structural and noise checks for one lowercased candidate.
pub(crate) fn is_plausible(config: &Config, email: &str) -> bool {
    if email.len() >= 100 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let local = match parts.next() {
        Some(l) if !l.is_empty() => l,
        _ => return false,
    };
    let domain = match parts.next() {
        Some(d) if !d.is_empty() => d,
        _ => return false,
    };
    if domain.contains('@') || !domain.contains('.') {
        return false;
    }

    // Placeholder and infrastructure domains, matched as substrings so
    // subdomains like o123.ingest.sentry.io are caught too.
    if config
        .excluded_email_domains
        .iter()
        .any(|excluded| domain.contains(excluded.as_str()))
    {
        tracing::trace!(target: "contact_task", "Dropping excluded-domain candidate: {}", email);
        return false;
    }

    // Asset filenames: either the whole string ends in an asset extension,
    // or the local part embeds one (image@2x.png style fragments).
    for ext in &config.asset_extensions {
        if email.ends_with(ext.as_str()) {
            return false;
        }
        let bare = ext.trim_start_matches('.');
        if !bare.is_empty() && local.contains(bare) {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn extracts_and_filters_page_noise() {
        let cfg = config();
        let body = "Reach us at Info@Acme.com or support@acme.com. \
                    Errors go to noreply@o123.ingest.sentry.io and the header \
                    is logo@2x.png while docs say user@example.com.";
        let found = extract_candidates(&cfg, body);
        let expected: BTreeSet<String> = ["info@acme.com", "support@acme.com"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn duplicates_collapse_case_insensitively() {
        let cfg = config();
        let body = "sales@acme.com SALES@ACME.COM Sales@Acme.Com";
        let found = extract_candidates(&cfg, body);
        assert_eq!(found.len(), 1);
        assert!(found.contains("sales@acme.com"));
    }

    #[test]
    fn structural_rejections() {
        let cfg = config();
        assert!(!is_plausible(&cfg, "no-at-sign.acme.com"));
        assert!(!is_plausible(&cfg, "user@localhost"));
        assert!(!is_plausible(&cfg, "@acme.com"));
        assert!(!is_plausible(&cfg, "user@"));
        let long = format!("{}@acme.com", "a".repeat(120));
        assert!(!is_plausible(&cfg, &long));
    }

    #[test]
    fn asset_extension_in_local_part_rejects() {
        let cfg = config();
        assert!(!is_plausible(&cfg, "hero.jpg@assets.acme.com"));
        assert!(!is_plausible(&cfg, "icon@acme.com.svg"));
        assert!(is_plausible(&cfg, "contact@acme.com"));
    }
}
