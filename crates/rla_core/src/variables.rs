//! Verifier tunables with safe defaults.
//!
//! Notes:
//! - `phantom_policy` decides how non-`AUDITED` draws enter the polling
//!   statistic. `WorstCase` is the normative choice; `Simulate` exists for
//!   sensitivity analysis and is always driven by an explicit seed.
//! - `ComparisonParams` rates are carried and reported, but the comparison
//!   p-value does not consume them.

use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Treatment of sampled ballots that were never retrieved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "mode", rename_all = "snake_case"))]
pub enum PhantomPolicy {
    /// Charge every phantom draw to the best-ranked loser.
    #[default]
    WorstCase,
    /// Draw each phantom's vote uniformly among the contest's candidates.
    Simulate { seed: u64 },
}

/// Constants of the Stark-style comparison risk formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ComparisonParams {
    /// Error-inflation factor γ.
    pub gamma: Decimal,
    /// Expected one-vote overstatement rate.
    pub o1_rate: Decimal,
    /// Expected two-vote overstatement rate.
    pub o2_rate: Decimal,
    /// Expected one-vote understatement rate.
    pub u1_rate: Decimal,
    /// Expected two-vote understatement rate.
    pub u2_rate: Decimal,
}

impl Default for ComparisonParams {
    fn default() -> Self {
        Self {
            gamma: Decimal::new(103_905, 5),
            o1_rate: Decimal::new(1, 3),
            o2_rate: Decimal::new(1, 4),
            u1_rate: Decimal::new(1, 3),
            u2_rate: Decimal::new(1, 4),
        }
    }
}

/// All knobs of one verification run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VerifyParams {
    pub phantom_policy: PhantomPolicy,
    /// Step added to a colliding ticket number until it is unique.
    pub ticket_epsilon: f64,
    /// Absolute tolerance when comparing recomputed and reported p-values.
    pub p_value_tolerance: f64,
    pub comparison: ComparisonParams,
}

impl Default for VerifyParams {
    fn default() -> Self {
        Self {
            phantom_policy: PhantomPolicy::WorstCase,
            ticket_epsilon: 1e-10,
            p_value_tolerance: 1e-4,
            comparison: ComparisonParams::default(),
        }
    }
}

impl VerifyParams {
    /// Same parameters with phantom simulation seeded by `seed`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.phantom_policy = PhantomPolicy::Simulate { seed };
        self
    }
}
