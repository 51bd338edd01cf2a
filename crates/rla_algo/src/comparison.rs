//! crates/rla_algo/src/comparison.rs
//! Ballot-comparison risk (Stark's super-simple method).
//!
//! Per contest:
//!   U   = 2γ / diluted_margin         (unbounded when the margin is not positive)
//!   V   = worst-winner votes − best-loser votes
//!   p_b = (1 − 1/U) / (1 − e_r / (2γ/V)),   e_r = e / V
//!
//! `e` is the discrepancy for the (worst winner, best loser) pair only: 2 for
//! a CVR naming the winner where the hand count shows the loser, 1 for a CVR
//! naming neither where the hand count shows the loser, 0 otherwise.
//! Understatements score 0, and the declared misstatement rates are reported
//! as expected counts but do not enter p_b.
//!
//! Arithmetic is `bigdecimal` rounded to `PRECISION` significant digits
//! after every step. The exponent is unbounded, so long samples neither
//! overflow nor underflow; only a zero divisor is an error.

use std::fmt;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{One, Zero};
use rla_core::ComparisonParams;
use rust_decimal::Decimal;
use tracing::debug;

use crate::margin::ContestMargin;
use crate::sample::order_by_ticket;
use crate::AlgoError;

/// Significant digits kept by every product and quotient.
pub const PRECISION: u64 = 60;

/// Error-inflation limit `U`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorBound {
    Finite(BigDecimal),
    /// Zero or negative margin: no sample size can confirm the outcome.
    Unbounded,
}

impl ErrorBound {
    /// 1/U, with 1/∞ = 0. `None` for U = 0.
    pub fn inverse(&self) -> Option<BigDecimal> {
        match self {
            ErrorBound::Finite(u) => quotient(&BigDecimal::one(), u),
            ErrorBound::Unbounded => Some(BigDecimal::zero()),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, ErrorBound::Unbounded)
    }
}

impl fmt::Display for ErrorBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorBound::Finite(u) => write!(f, "{u}"),
            ErrorBound::Unbounded => f.write_str("inf"),
        }
    }
}

/// One sampled ballot for a comparison audit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComparisonBallot<'a> {
    pub ticket: f64,
    pub cvr: &'a str,
    /// Hand-count result; `None` when the ballot was never audited.
    pub audit: Option<&'a str>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiscrepancyCounts {
    pub two_vote_over: usize,
    pub one_vote_over: usize,
    pub none: usize,
}

/// Declared rates × audited ballots. Informational only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpectedMisstatements {
    pub o1: BigDecimal,
    pub o2: BigDecimal,
    pub u1: BigDecimal,
    pub u2: BigDecimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComparisonOutcome {
    /// Unclamped product; may exceed 1.
    pub p_value: BigDecimal,
    pub error_bound: ErrorBound,
    /// V, the margin in votes.
    pub margin_votes: i64,
    pub counts: DiscrepancyCounts,
    pub expected: ExpectedMisstatements,
    pub audited: usize,
    /// Sampled but never audited; excluded from the product.
    pub unaudited: usize,
    pub collisions: usize,
}

impl ComparisonOutcome {
    pub fn tot_p(&self) -> &BigDecimal {
        &self.p_value
    }

    /// No adaptive stopping here, so identical to `tot_p`.
    pub fn seq_p(&self) -> &BigDecimal {
        &self.p_value
    }
}

/// Exact conversion of a fixed-point parameter.
fn exact(d: Decimal) -> BigDecimal {
    BigDecimal::new(BigInt::from(d.mantissa()), i64::from(d.scale()))
}

fn product(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    (a * b).with_prec(PRECISION)
}

fn quotient(a: &BigDecimal, b: &BigDecimal) -> Option<BigDecimal> {
    if b.is_zero() {
        None
    } else {
        Some((a / b).with_prec(PRECISION))
    }
}

fn mentions(result: &str, name: &str) -> bool {
    result.split(',').any(|c| c.trim() == name)
}

/// Discrepancy score `e` for one ballot against the (worst winner, best loser) pair.
pub fn classify_discrepancy(margin: &ContestMargin, cvr: &str, audit: &str) -> u8 {
    let winner = margin.worst_winner.name.as_str();
    let loser = margin.best_loser.name.as_str();

    let audit_shows_loser = mentions(audit, loser) && !mentions(audit, winner);
    if !audit_shows_loser {
        return 0;
    }
    match (mentions(cvr, winner), mentions(cvr, loser)) {
        (true, false) => 2,
        (false, false) => 1,
        _ => 0,
    }
}

/// Attained risk for one contest of a comparison audit.
///
/// Fails only on a zero divisor, which takes a degenerate γ: γ = 0, or
/// γ = 1 once a two-vote overstatement is sampled.
pub fn comparison_risk<'a>(
    margin: &ContestMargin,
    ballots: impl IntoIterator<Item = ComparisonBallot<'a>>,
    params: &ComparisonParams,
    epsilon: f64,
) -> Result<ComparisonOutcome, AlgoError> {
    let arith = |context: &'static str| AlgoError::Arithmetic {
        contest: margin.contest.clone(),
        context,
    };

    let two_gamma = exact(params.gamma) * BigDecimal::from(2u8);
    let margin_votes = margin.diluted.vote_gap;
    let v = BigDecimal::from(margin_votes);

    // U = 2γ / (V / N) = 2γN / V
    let error_bound = if margin.diluted.is_auditable() {
        let scaled = product(&two_gamma, &BigDecimal::from(margin.diluted.ballots_cast));
        ErrorBound::Finite(quotient(&scaled, &v).ok_or_else(|| arith("U"))?)
    } else {
        ErrorBound::Unbounded
    };
    let inv_u = error_bound.inverse().ok_or_else(|| arith("1/U"))?;
    let numerator = BigDecimal::one() - inv_u;

    // p_b for e = 0, 1, 2; `None` where a divisor vanishes.
    // The term e_r/(2γ/V) is taken as 0 when V = 0.
    let factor = |e: u8| -> Option<BigDecimal> {
        if e == 0 || v.is_zero() {
            return Some(numerator.clone());
        }
        let gamma_over_v = quotient(&two_gamma, &v)?;
        let e_r = quotient(&BigDecimal::from(e), &v)?;
        let term = quotient(&e_r, &gamma_over_v)?;
        quotient(&numerator, &(BigDecimal::one() - term))
    };
    let factors = [factor(0), factor(1), factor(2)];

    let ordered = order_by_ticket(ballots.into_iter().map(|b| (b.ticket, b)), epsilon);

    let mut p_value = BigDecimal::one();
    let mut counts = DiscrepancyCounts::default();
    let mut audited = 0usize;
    let mut unaudited = 0usize;

    for (_, ballot) in &ordered.draws {
        let Some(audit) = ballot.audit else {
            unaudited += 1;
            continue;
        };
        audited += 1;

        let e = classify_discrepancy(margin, ballot.cvr, audit);
        match e {
            2 => counts.two_vote_over += 1,
            1 => counts.one_vote_over += 1,
            _ => counts.none += 1,
        }
        let p_b = factors[usize::from(e.min(2))].as_ref().ok_or_else(|| arith("p_b"))?;
        p_value = product(&p_value, p_b);
    }

    let n = BigDecimal::from(audited as u64);
    let expected = ExpectedMisstatements {
        o1: exact(params.o1_rate) * &n,
        o2: exact(params.o2_rate) * &n,
        u1: exact(params.u1_rate) * &n,
        u2: exact(params.u2_rate) * &n,
    };

    debug!(
        contest = %margin.contest,
        audited,
        unaudited,
        two_vote = counts.two_vote_over,
        one_vote = counts.one_vote_over,
        %p_value,
        "comparison risk computed"
    );

    Ok(ComparisonOutcome {
        p_value,
        error_bound,
        margin_votes,
        counts,
        expected,
        audited,
        unaudited,
        collisions: ordered.collisions,
    })
}

// ----- Tests -----
