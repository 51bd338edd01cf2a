//! Typed report entities shared by the algorithm and pipeline layers.
//!
//! These are the strongly-typed mirrors of the lenient section records
//! produced by `rla_io`. Conversion (and all key/number failures) happens in
//! `rla_pipeline::extract`; everything here is plain value data.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// `Audited?` value marking a ballot that was retrieved and hand-audited.
pub const AUDITED_FLAG: &str = "AUDITED";

/// Audit/CVR result token for a sampled ballot that does not carry the contest.
pub const CONTEST_NOT_ON_BALLOT: &str = "CONTEST_NOT_ON_BALLOT";

// ----------------------------- Election / settings -----------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElectionInfo {
    pub name: String,
    pub state: String,
}

/// Audit methodology declared by the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AuditType {
    #[cfg_attr(feature = "serde", serde(rename = "BALLOT_POLLING"))]
    BallotPolling,
    #[cfg_attr(feature = "serde", serde(rename = "BALLOT_COMPARISON"))]
    BallotComparison,
}

impl AuditType {
    pub fn as_tag(self) -> &'static str {
        match self {
            AuditType::BallotPolling => "BALLOT_POLLING",
            AuditType::BallotComparison => "BALLOT_COMPARISON",
        }
    }
}

impl fmt::Display for AuditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for AuditType {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "BALLOT_POLLING" => Ok(AuditType::BallotPolling),
            "BALLOT_COMPARISON" => Ok(AuditType::BallotComparison),
            other => Err(CoreError::UnsupportedAuditType(other.to_string())),
        }
    }
}

/// AUDIT SETTINGS as consumed by the engines.
///
/// The audit type is kept as its raw tag: an unsupported tag is a reported
/// condition for the whole file, not a parse failure.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AuditSettings {
    /// Fraction in (0, 1).
    pub risk_limit: f64,
    pub audit_type_tag: String,
}

impl AuditSettings {
    pub fn audit_type(&self) -> Result<AuditType, CoreError> {
        self.audit_type_tag.parse()
    }
}

/// Parse a percentage string such as `"10%"` (or `"10"`) into a fraction.
pub fn parse_risk_limit(raw: &str) -> Result<f64, CoreError> {
    let s = raw.trim();
    let digits = s.strip_suffix('%').unwrap_or(s).trim();
    let pct: f64 = digits
        .parse()
        .map_err(|_| CoreError::InvalidRiskLimit(raw.to_string()))?;
    let frac = pct / 100.0;
    if !(frac > 0.0 && frac < 1.0) {
        return Err(CoreError::InvalidRiskLimit(raw.to_string()));
    }
    Ok(frac)
}

// ----------------------------------- Contests -----------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contest {
    pub name: String,
    pub targeted: bool,
    pub num_winners: usize,
    pub total_ballots_cast: u64,
    /// Raw `Name:Count;Name:Count;…` tabulation.
    pub tabulated_votes: String,
}

/// One tabulated candidate (derived from `Contest::tabulated_votes`).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Candidate {
    pub name: String,
    pub votes: u64,
}

impl Candidate {
    pub fn new(name: impl Into<String>, votes: u64) -> Self {
        Self { name: name.into(), votes }
    }
}

// ------------------------------------ Rounds ------------------------------------

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Round {
    pub round_number: u32,
    pub contest: String,
    /// Platform-reported p-value; absent when the column is empty.
    pub p_value: Option<f64>,
}

// ------------------------------- Sampled ballots -------------------------------

/// Ticket numbers from one `Ticket Numbers[: <contest>]` column.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TicketColumn {
    /// `None` for the bare, report-wide `Ticket Numbers` column.
    pub contest: Option<String>,
    pub tickets: Vec<f64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SampledBallot {
    pub audited: bool,
    pub tickets: Vec<TicketColumn>,
    /// Contest name → hand-audit interpretation.
    pub audit_results: BTreeMap<String, String>,
    /// Contest name → machine (CVR) interpretation; comparison audits only.
    pub cvr_results: BTreeMap<String, String>,
}

impl SampledBallot {
    /// Ticket numbers under which this ballot was drawn for `contest`.
    ///
    /// A per-contest column wins over the global one, even when it is empty
    /// (the ballot was not drawn for that contest).
    pub fn tickets_for(&self, contest: &str) -> &[f64] {
        if let Some(col) = self.tickets.iter().find(|c| c.contest.as_deref() == Some(contest)) {
            return &col.tickets;
        }
        self.tickets
            .iter()
            .find(|c| c.contest.is_none())
            .map(|c| c.tickets.as_slice())
            .unwrap_or(&[])
    }

    pub fn audit_result(&self, contest: &str) -> Option<&str> {
        self.audit_results.get(contest).map(String::as_str)
    }

    pub fn cvr_result(&self, contest: &str) -> Option<&str> {
        self.cvr_results.get(contest).map(String::as_str)
    }
}

/// Split a packed ticket field (`"0.12,0.57"` or `"0.12:0.57"`) into reals.
///
/// Empty fields yield an empty list; any non-finite or non-numeric piece fails.
pub fn parse_ticket_numbers(raw: &str) -> Result<Vec<f64>, CoreError> {
    raw.split(|c: char| c == ',' || c == ':')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(CoreError::InvalidTicket(s.to_string())),
        })
        .collect()
}
