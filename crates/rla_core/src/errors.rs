//! Minimal error set for core-domain parsing.

use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum CoreError {
    /// Audit type tag other than `BALLOT_POLLING` / `BALLOT_COMPARISON`.
    #[error("unsupported audit type: {0}")]
    UnsupportedAuditType(String),

    /// Risk limit that does not parse as a percentage in (0, 100).
    #[error("invalid risk limit: {0}")]
    InvalidRiskLimit(String),

    /// Ticket number that is not a finite real.
    #[error("invalid ticket number: {0}")]
    InvalidTicket(String),
}
