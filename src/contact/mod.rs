//! Contact discovery: a bounded crawl of a business website's likely
//! contact pages, followed by optional mailbox verification.

pub mod extract;
pub mod fetch;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::models::NOT_AVAILABLE;
use crate::utils::domain::{email_domain, normalize_url};
use crate::verification::dns::{MailServerResolver, MxResolver};
use crate::verification::smtp::{MailboxProber, ProbeOutcome, RecipientProber};
use crate::verification::{handshake_admits, resolution_admits, VerificationOutcome};
use fetch::{FetchKind, PageFetcher};
use std::collections::BTreeSet;
use url::Url;

/// Crawls one website for contact addresses.
///
/// The crawl frontier is fixed up front: the homepage, then a short list of
/// conventional contact paths. The first page that yields any plausible
/// candidate ends the crawl; results from different pages are never merged.
pub struct ContactEngine {
    config: Config,
    fetcher: Box<dyn PageFetcher>,
    resolver: Option<Box<dyn MailServerResolver>>,
    prober: Option<Box<dyn RecipientProber>>,
}

impl ContactEngine {
    pub fn new(config: &Config, fetcher: Box<dyn PageFetcher>) -> Result<Self> {
        let (resolver, prober): (
            Option<Box<dyn MailServerResolver>>,
            Option<Box<dyn RecipientProber>>,
        ) = if config.verify_emails {
            (
                Some(Box::new(MxResolver::new(config))),
                Some(Box::new(MailboxProber::new(config)?)),
            )
        } else {
            (None, None)
        };
        Ok(Self {
            config: config.clone(),
            fetcher,
            resolver,
            prober,
        })
    }

    /// Discovers contact addresses for `website`, returning a comma-joined
    /// sorted list or the sentinel.
    ///
    /// Never fails the record: a missing website, an unusable URL, a fully
    /// failed crawl and an empty result all come back as the sentinel.
    pub async fn discover(&self, website: &str) -> String {
        let trimmed = website.trim();
        if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
            return NOT_AVAILABLE.to_string();
        }

        let homepage = match normalize_url(trimmed) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(target: "contact_task",
                    "Unusable website value '{}': {}", trimmed, e);
                return NOT_AVAILABLE.to_string();
            }
        };

        let candidates = self.crawl(&homepage).await;
        if candidates.is_empty() {
            return NOT_AVAILABLE.to_string();
        }

        let admitted = self.verify(candidates).await;
        if admitted.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            admitted.into_iter().collect::<Vec<_>>().join(", ")
        }
    }

    /// Walks the fixed frontier, stopping at the first page with candidates.
    async fn crawl(&self, homepage: &Url) -> BTreeSet<String> {
        for (url, kind) in self.frontier(homepage) {
            match self.fetcher.fetch(&url, kind).await {
                Ok(body) => {
                    let candidates = extract::extract_candidates(&self.config, &body);
                    if !candidates.is_empty() {
                        tracing::info!(target: "contact_task",
                            "Found {} candidate(s) on {}", candidates.len(), url);
                        return candidates;
                    }
                    tracing::debug!(target: "contact_task", "No candidates on {}", url);
                }
                Err(e) => {
                    tracing::debug!(target: "contact_task", "Fetch failed for {}: {}", url, e);
                }
            }
        }
        BTreeSet::new()
    }

    fn frontier(&self, homepage: &Url) -> Vec<(Url, FetchKind)> {
        let mut urls = vec![(homepage.clone(), FetchKind::Homepage)];
        for path in &self.config.contact_paths {
            match homepage.join(path) {
                Ok(url) => urls.push((url, FetchKind::ContactPath)),
                Err(e) => {
                    tracing::debug!(target: "contact_task",
                        "Skipping unjoinable contact path '{}': {}", path, e);
                }
            }
        }
        urls
    }

    /// Applies the two-stage verification policy to each candidate.
    ///
    /// Resolution is fail-closed (no mail exchange means the candidate is
    /// dropped); the handshake is fail-open (an unreachable or misbehaving
    /// server keeps the candidate). With verification disabled, every
    /// candidate passes through.
    async fn verify(&self, candidates: BTreeSet<String>) -> BTreeSet<String> {
        let (resolver, prober) = match (&self.resolver, &self.prober) {
            (Some(resolver), Some(prober)) => (resolver.as_ref(), prober.as_ref()),
            _ => return candidates,
        };

        let mut admitted = BTreeSet::new();
        for email in candidates {
            let (resolution, exchange) = self.resolve_stage(resolver, &email).await;
            if !resolution_admits(&resolution) {
                tracing::debug!(target: "contact_task",
                    "Dropping {} at resolution stage.", email);
                continue;
            }
            let exchange = match exchange {
                Some(exchange) => exchange,
                None => continue,
            };

            let handshake = match prober.probe(&email, &exchange).await {
                ProbeOutcome::Accepted => VerificationOutcome::Verified,
                ProbeOutcome::Rejected(reason) => {
                    tracing::debug!(target: "contact_task",
                        "Mailbox rejected {}: {}", email, reason);
                    VerificationOutcome::Rejected
                }
                ProbeOutcome::Unreachable(reason) => {
                    tracing::debug!(target: "contact_task",
                        "Handshake inconclusive for {} ({}); keeping it.", email, reason);
                    VerificationOutcome::Unavailable
                }
            };
            if handshake_admits(&handshake) {
                admitted.insert(email);
            }
        }
        admitted
    }

    async fn resolve_stage(
        &self,
        resolver: &dyn MailServerResolver,
        email: &str,
    ) -> (VerificationOutcome, Option<String>) {
        let domain = match email_domain(email) {
            Ok(domain) => domain,
            Err(e) => {
                tracing::debug!(target: "contact_task",
                    "Cannot take domain of '{}': {}", email, e);
                return (VerificationOutcome::Rejected, None);
            }
        };
        match resolver.resolve(&domain).await {
            Ok(server) => (VerificationOutcome::Verified, Some(server.exchange)),
            Err(e) => {
                tracing::debug!(target: "contact_task",
                    "MX resolution failed for {}: {}", domain, e);
                (VerificationOutcome::Rejected, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use crate::verification::dns::MailServer;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct ScriptedFetcher {
        pages: Arc<HashMap<String, String>>,
        visited: Arc<Mutex<Vec<(String, FetchKind)>>>,
    }

    impl ScriptedFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: Arc::new(
                    pages
                        .iter()
                        .map(|(url, body)| (url.to_string(), body.to_string()))
                        .collect(),
                ),
                visited: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn visited(&self) -> Vec<String> {
            self.visited
                .lock()
                .unwrap()
                .iter()
                .map(|(url, _)| url.clone())
                .collect()
        }

        fn kinds(&self) -> Vec<FetchKind> {
            self.visited
                .lock()
                .unwrap()
                .iter()
                .map(|(_, kind)| *kind)
                .collect()
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &Url, kind: FetchKind) -> crate::core::error::Result<String> {
            self.visited.lock().unwrap().push((url.to_string(), kind));
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| AppError::HttpStatus {
                    status: 404,
                    url: url.to_string(),
                })
        }
    }

    /// Resolves an MX only for the listed domains; everything else is
    /// treated as mail-less.
    struct ScriptedResolver {
        domains_with_mx: Vec<&'static str>,
    }

    #[async_trait]
    impl MailServerResolver for ScriptedResolver {
        async fn resolve(&self, domain: &str) -> crate::core::error::Result<MailServer> {
            if self.domains_with_mx.contains(&domain) {
                Ok(MailServer {
                    exchange: format!("mx.{}", domain),
                    preference: 10,
                })
            } else {
                Err(AppError::NoMxRecords(domain.to_string()))
            }
        }
    }

    struct ScriptedProber {
        outcomes: HashMap<String, ProbeOutcome>,
    }

    #[async_trait]
    impl RecipientProber for ScriptedProber {
        async fn probe(&self, email: &str, _mail_server: &str) -> ProbeOutcome {
            self.outcomes
                .get(email)
                .cloned()
                .unwrap_or_else(|| ProbeOutcome::Rejected("unscripted".to_string()))
        }
    }

    fn unverified_config() -> Config {
        Config {
            verify_emails: false,
            ..Config::default()
        }
    }

    fn engine(pages: &[(&str, &str)]) -> (ContactEngine, ScriptedFetcher) {
        let fetcher = ScriptedFetcher::new(pages);
        let engine = ContactEngine::new(&unverified_config(), Box::new(fetcher.clone())).unwrap();
        (engine, fetcher)
    }

    fn verifying_engine(
        pages: &[(&str, &str)],
        domains_with_mx: Vec<&'static str>,
        outcomes: &[(&str, ProbeOutcome)],
    ) -> ContactEngine {
        ContactEngine {
            config: Config::default(),
            fetcher: Box::new(ScriptedFetcher::new(pages)),
            resolver: Some(Box::new(ScriptedResolver { domains_with_mx })),
            prober: Some(Box::new(ScriptedProber {
                outcomes: outcomes
                    .iter()
                    .map(|(email, outcome)| (email.to_string(), outcome.clone()))
                    .collect(),
            })),
        }
    }

    #[tokio::test]
    async fn sentinel_website_skips_all_network_work() {
        let (engine, fetcher) = engine(&[]);
        assert_eq!(engine.discover("N/A").await, "N/A");
        assert_eq!(engine.discover("").await, "N/A");
        assert_eq!(engine.discover("   ").await, "N/A");
        assert!(fetcher.visited().is_empty());
    }

    #[tokio::test]
    async fn homepage_hit_short_circuits_the_frontier() {
        let (engine, fetcher) = engine(&[(
            "https://acme.com/",
            "Write to sales@acme.com or ops@acme.com",
        )]);
        let result = engine.discover("acme.com").await;
        assert_eq!(result, "ops@acme.com, sales@acme.com");
        assert_eq!(fetcher.visited(), vec!["https://acme.com/".to_string()]);
        assert_eq!(fetcher.kinds(), vec![FetchKind::Homepage]);
    }

    #[tokio::test]
    async fn crawl_advances_to_first_page_with_candidates() {
        let (engine, fetcher) = engine(&[
            ("https://acme.com/", "Welcome. No addresses here."),
            (
                "https://acme.com/contact",
                "info@acme.com and sales@acme.com, noreply@sentry.io",
            ),
            ("https://acme.com/about", "other@acme.com"),
        ]);
        let result = engine.discover("https://acme.com").await;
        assert_eq!(result, "info@acme.com, sales@acme.com");
        assert_eq!(
            fetcher.visited(),
            vec![
                "https://acme.com/".to_string(),
                "https://acme.com/contact".to_string(),
            ]
        );
        assert_eq!(
            fetcher.kinds(),
            vec![FetchKind::Homepage, FetchKind::ContactPath]
        );
    }

    #[tokio::test]
    async fn exhausted_frontier_yields_sentinel() {
        let (engine, fetcher) = engine(&[("https://acme.com/", "nothing to see")]);
        let result = engine.discover("acme.com").await;
        assert_eq!(result, "N/A");
        // Homepage plus every configured contact path was tried.
        assert_eq!(
            fetcher.visited().len(),
            1 + unverified_config().contact_paths.len()
        );
    }

    #[tokio::test]
    async fn filtered_out_candidates_do_not_stop_the_crawl() {
        let (engine, _) = engine(&[
            ("https://acme.com/", "docs say user@example.com"),
            ("https://acme.com/contact", "real person: info@acme.com"),
        ]);
        assert_eq!(engine.discover("acme.com").await, "info@acme.com");
    }

    #[tokio::test]
    async fn verification_drops_mx_failures_and_keeps_unreachable_servers() {
        // Four candidates exercise every stage outcome: accepted mailbox,
        // domain without a mail exchange (dropped at resolution), server
        // that never answers (kept), and an explicit mailbox rejection.
        let engine = verifying_engine(
            &[(
                "https://acme.com/",
                "info@acme.com gone@nomail.net sales@acme.com old@acme.com",
            )],
            vec!["acme.com"],
            &[
                ("info@acme.com", ProbeOutcome::Accepted),
                (
                    "sales@acme.com",
                    ProbeOutcome::Unreachable("connection timed out".to_string()),
                ),
                (
                    "old@acme.com",
                    ProbeOutcome::Rejected("550 no such user".to_string()),
                ),
            ],
        );
        let result = engine.discover("acme.com").await;
        assert_eq!(result, "info@acme.com, sales@acme.com");
    }

    #[tokio::test]
    async fn all_candidates_rejected_yields_sentinel() {
        let engine = verifying_engine(
            &[("https://acme.com/", "info@nomail.net")],
            vec![],
            &[],
        );
        assert_eq!(engine.discover("acme.com").await, "N/A");
    }
}
