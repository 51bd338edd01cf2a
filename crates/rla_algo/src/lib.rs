// crates/rla_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Pure risk arithmetic for risk-limiting audit verification.
//!
//! No I/O and no report parsing: inputs are `rla_core` entities and
//! already-extracted ballot observations. Every engine is deterministic for a
//! given input order (and, for phantom simulation, a given seed).

use thiserror::Error;

pub mod margin;
pub mod sample;
#[cfg(feature = "polling")]
pub mod polling;
#[cfg(feature = "comparison")]
pub mod comparison;

/// Failures inside the risk engines (margin failures live in `margin::MarginError`).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AlgoError {
    /// Zero divisor while deriving the per-ballot factors.
    #[error("contest {contest}: arithmetic failure in {context}")]
    Arithmetic { contest: String, context: &'static str },
}

// Tight, explicit re-exports (avoid wildcard export drift).
pub use margin::{compute_margin, parse_tabulation, ContestMargin, DilutedMargin, MarginError};
pub use sample::{order_by_ticket, OrderedDraws, TicketKey};

#[cfg(feature = "polling")]
pub use polling::{polling_risk, Draw, Observation, PairRisk, PhantomSource, PollingOutcome};

#[cfg(feature = "comparison")]
pub use comparison::{
    classify_discrepancy, comparison_risk, ComparisonBallot, ComparisonOutcome, DiscrepancyCounts,
    ErrorBound, ExpectedMisstatements,
};
