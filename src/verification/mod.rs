//! Candidate verification: DNS mail-exchange resolution followed by an
//! SMTP recipient probe.
//!
//! The two stages apply opposite policies to inconclusive checks, and that
//! asymmetry is a contract of this crate, not an accident to clean up:
//! a failed MX lookup rejects the candidate, while an unreachable or
//! misbehaving mail server accepts it.

pub mod dns;
pub mod smtp;

/// Result of a single verification stage for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The stage positively confirmed the candidate.
    Verified,
    /// The stage positively denied the candidate.
    Rejected,
    /// The stage could not be performed (no MX record, unreachable host,
    /// protocol failure). Each stage maps this differently.
    Unavailable,
}

/// Fail-closed: the resolution stage only admits a positive result.
pub fn resolution_admits(outcome: &VerificationOutcome) -> bool {
    matches!(outcome, VerificationOutcome::Verified)
}

/// Fail-open: the handshake stage admits anything that was not an explicit
/// rejection from the mail server.
pub fn handshake_admits(outcome: &VerificationOutcome) -> bool {
    matches!(
        outcome,
        VerificationOutcome::Verified | VerificationOutcome::Unavailable
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_stage_is_fail_closed() {
        assert!(resolution_admits(&VerificationOutcome::Verified));
        assert!(!resolution_admits(&VerificationOutcome::Rejected));
        assert!(!resolution_admits(&VerificationOutcome::Unavailable));
    }

    #[test]
    fn handshake_stage_is_fail_open() {
        assert!(handshake_admits(&VerificationOutcome::Verified));
        assert!(!handshake_admits(&VerificationOutcome::Rejected));
        assert!(handshake_admits(&VerificationOutcome::Unavailable));
    }
}
