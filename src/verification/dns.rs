//! DNS resolver construction and mail-exchange lookups.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use async_trait::async_trait;
use std::net::IpAddr;
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::proto::op::ResponseCode;
use trust_dns_resolver::TokioAsyncResolver;

/// The preferred mail exchange for a domain.
#[derive(Debug, Clone)]
pub struct MailServer {
    pub exchange: String,
    pub preference: u16,
}

/// Resolves the mail exchange responsible for a domain. The contact engine
/// only sees this seam, so the fail-closed resolution policy is testable
/// without live DNS.
#[async_trait]
pub trait MailServerResolver: Send + Sync {
    async fn resolve(&self, domain: &str) -> Result<MailServer>;
}

/// Production resolver backed by the configured nameservers.
pub struct MxResolver {
    inner: TokioAsyncResolver,
}

impl MxResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            inner: create_resolver(config),
        }
    }
}

#[async_trait]
impl MailServerResolver for MxResolver {
    async fn resolve(&self, domain: &str) -> Result<MailServer> {
        resolve_mail_server(&self.inner, domain).await
    }
}

/// Builds the shared resolver from configured nameservers, falling back to
/// system defaults when none are configured or parseable.
pub fn create_resolver(config: &Config) -> TokioAsyncResolver {
    let mut opts = ResolverOpts::default();
    opts.timeout = config.dns_timeout;

    let ips: Vec<IpAddr> = config
        .dns_servers
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    if ips.is_empty() {
        tracing::debug!(target: "dns", "No usable DNS servers configured; using defaults.");
        return TokioAsyncResolver::tokio(ResolverConfig::default(), opts);
    }

    let group = NameServerConfigGroup::from_ips_clear(&ips, 53, true);
    let resolver_config = ResolverConfig::from_parts(None, vec![], group);
    TokioAsyncResolver::tokio(resolver_config, opts)
}

/// Resolves the lowest-preference MX record for `domain`.
///
/// Distinguishes a non-existent domain (`NxDomain`) from a live domain
/// without mail exchanges (`NoMxRecords`); both reject the candidate at the
/// resolution stage.
pub async fn resolve_mail_server(
    resolver: &TokioAsyncResolver,
    domain: &str,
) -> Result<MailServer> {
    tracing::debug!(target: "dns", "Resolving MX records for {}...", domain);

    let lookup = resolver.mx_lookup(domain).await.map_err(|e| {
        if let ResolveErrorKind::NoRecordsFound { response_code, .. } = e.kind() {
            if *response_code == ResponseCode::NXDomain {
                return AppError::NxDomain(domain.to_string());
            }
            return AppError::NoMxRecords(domain.to_string());
        }
        AppError::Dns(e)
    })?;

    let best = lookup
        .iter()
        .min_by_key(|mx| mx.preference())
        .ok_or_else(|| AppError::NoMxRecords(domain.to_string()))?;

    let exchange = best
        .exchange()
        .to_utf8()
        .trim_end_matches('.')
        .to_string();
    if exchange.is_empty() {
        return Err(AppError::NoMxRecords(domain.to_string()));
    }

    tracing::debug!(target: "dns",
        "Using mail exchange {} (preference {}) for {}", exchange, best.preference(), domain);
    Ok(MailServer {
        exchange,
        preference: best.preference(),
    })
}
