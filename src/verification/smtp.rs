//! Mail-transfer handshake probing for candidate addresses.

use crate::core::config::Config;
use crate::core::error::Result;
use async_trait::async_trait;
use lettre::transport::smtp::client::SmtpConnection;
use lettre::transport::smtp::commands::{Ehlo, Mail, Rcpt};
use lettre::transport::smtp::extension::ClientId;
use lettre::transport::smtp::response::Severity;
use lettre::Address;
use std::net::ToSocketAddrs;
use std::str::FromStr;
use std::time::Duration;

/// What a single recipient probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered the recipient probe with a success-class code.
    Accepted,
    /// The server answered with a non-success code.
    Rejected(String),
    /// The handshake never produced an answer: connection refused or reset,
    /// timeout, or a protocol failure mid-exchange.
    Unreachable(String),
}

/// Asks a mail exchange whether it would accept mail for an address. The
/// contact engine only sees this seam, so the fail-open handshake policy is
/// testable without a live mail server.
#[async_trait]
pub trait RecipientProber: Send + Sync {
    /// Never errors: everything that prevents a definitive answer collapses
    /// into [`ProbeOutcome::Unreachable`].
    async fn probe(&self, email: &str, mail_server: &str) -> ProbeOutcome;
}

/// Issues a greeting / synthetic sender / recipient-existence probe against
/// a resolved mail exchange.
pub struct MailboxProber {
    sender: Address,
    timeout: Duration,
    helo_name: ClientId,
}

impl MailboxProber {
    pub fn new(config: &Config) -> Result<Self> {
        let sender = Address::from_str(&config.smtp_sender_email).map_err(|e| {
            crate::core::error::AppError::Config(format!("Invalid sender email in config: {}", e))
        })?;
        Ok(Self {
            sender,
            timeout: config.smtp_timeout,
            helo_name: ClientId::Domain("localhost".to_string()),
        })
    }
}

#[async_trait]
impl RecipientProber for MailboxProber {
    async fn probe(&self, email: &str, mail_server: &str) -> ProbeOutcome {
        let recipient = match Address::from_str(email) {
            Ok(addr) => addr,
            Err(e) => {
                tracing::debug!(target: "smtp_task", "Invalid recipient format '{}': {}", email, e);
                return ProbeOutcome::Rejected(format!("Invalid recipient format: {}", e));
            }
        };

        let socket_addr = match (mail_server, 25u16)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
        {
            Some(addr) => addr,
            None => {
                tracing::debug!(target: "smtp_task",
                    "Could not resolve mail server address: {}", mail_server);
                return ProbeOutcome::Unreachable(format!(
                    "Could not resolve mail server address: {}",
                    mail_server
                ));
            }
        };

        tracing::debug!(target: "smtp_task",
            "Probing <{}> via {} ({})", email, mail_server, socket_addr);

        let mut conn = match SmtpConnection::connect(
            socket_addr,
            Some(self.timeout),
            &self.helo_name,
            None,
            None,
        ) {
            Ok(conn) => conn,
            Err(e) => {
                tracing::debug!(target: "smtp_task",
                    "Connection to {} failed: {}", mail_server, e);
                return ProbeOutcome::Unreachable(format!("Connection failed: {}", e));
            }
        };

        if let Err(e) = conn.command(Ehlo::new(self.helo_name.clone())) {
            tracing::debug!(target: "smtp_task", "EHLO failed on {}: {}", mail_server, e);
            conn.quit().ok();
            return ProbeOutcome::Unreachable(format!("EHLO failed: {}", e));
        }

        // A negative MAIL FROM response is not terminal here; the recipient
        // probe's own code decides acceptance.
        match conn.command(Mail::new(Some(self.sender.clone()), vec![])) {
            Ok(response) if !response.is_positive() => {
                tracing::debug!(target: "smtp_task",
                    "MAIL FROM not accepted by {}: {}", mail_server, response.code());
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(target: "smtp_task", "MAIL FROM failed on {}: {}", mail_server, e);
                conn.quit().ok();
                return ProbeOutcome::Unreachable(format!("MAIL FROM failed: {}", e));
            }
        }

        let outcome = match conn.command(Rcpt::new(recipient, vec![])) {
            Ok(response) => {
                let message = response.message().collect::<Vec<&str>>().join(" ");
                tracing::debug!(target: "smtp_task",
                    "RCPT TO:<{}> response from {}: {} {}", email, mail_server, response.code(), message);
                if response.code().severity == Severity::PositiveCompletion {
                    ProbeOutcome::Accepted
                } else {
                    ProbeOutcome::Rejected(format!("{} {}", response.code(), message))
                }
            }
            Err(e) => {
                tracing::debug!(target: "smtp_task",
                    "RCPT TO failed for <{}> on {}: {}", email, mail_server, e);
                ProbeOutcome::Unreachable(format!("RCPT TO failed: {}", e))
            }
        };

        conn.quit().ok();
        outcome
    }
}
