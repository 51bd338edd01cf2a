//! rla_report/src/lib.rs: offline report model + renderers (text/JSON).
//!
//! Determinism rules:
//! - No I/O here. Callers hand over finished verifications.
//! - Stable field names; contests in report order, pairs in ranked order.
//! - Decimal p-values travel as strings so no digits are lost.

#![deny(unsafe_code)]

use std::path::PathBuf;

use rla_algo::{ComparisonOutcome, PollingOutcome};
use rla_core::{Candidate, PhantomPolicy, VerifyParams};
use rla_pipeline::{
    engine_identifiers, AuditStatus, ContestVerification, PValueCheck, PipelineError, RiskCheck,
    Verification,
};
use serde::Serialize;
use thiserror::Error;

pub mod render_text;
#[cfg(feature = "render_json")]
pub mod render_json;

pub use render_text::render_text;
#[cfg(feature = "render_json")]
pub use render_json::{render_json, render_json_bytes};

// ===== Errors =====

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("json serialization failed: {0}")]
    Json(String),
    #[error("hashing failed: {0}")]
    Hash(String),
}

// ===== Model =====

#[derive(Clone, Debug, Serialize)]
pub struct RunModel {
    pub engine: EngineModel,
    pub params: ParamsModel,
    pub files: Vec<FileModel>,
}

#[derive(Clone, Debug, Serialize)]
pub struct EngineModel {
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ParamsModel {
    /// "worst_case" | "simulate"
    pub phantom_policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phantom_seed: Option<u64>,
    pub ticket_epsilon: f64,
    pub p_value_tolerance: f64,
    pub gamma: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Verified,
    Unsupported,
    Failed,
}

#[derive(Clone, Debug, Serialize)]
pub struct FileModel {
    pub path: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_sha256: Option<String>,
    pub election_name: String,
    pub state: String,
    pub audit_type: String,
    pub risk_limit: Option<f64>,
    pub contests: Vec<ContestModel>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CandidateModel {
    pub name: String,
    pub votes: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ContestModel {
    pub name: String,
    pub targeted: bool,
    pub worst_winner: String,
    pub best_loser: String,
    pub winners: Vec<CandidateModel>,
    pub losers: Vec<CandidateModel>,
    pub margin_votes: i64,
    pub total_ballots_cast: u64,
    /// `None` when no ballots were cast.
    pub diluted_margin: Option<f64>,
    pub ballots_with_contest: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<CheckModel>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PairModel {
    pub winner: String,
    pub loser: String,
    pub share: f64,
    pub t: f64,
    pub total_t: f64,
    pub finished_at: Option<usize>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExpectedModel {
    pub o1: String,
    pub o2: String,
    pub u1: String,
    pub u2: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum RiskModel {
    Polling {
        tot_p: f64,
        seq_p: f64,
        stop_index: Option<usize>,
        draws: usize,
        phantoms: usize,
        unrecognized: usize,
        collisions: usize,
        pairs: Vec<PairModel>,
    },
    Comparison {
        p_value: String,
        error_bound: String,
        audited: usize,
        unaudited: usize,
        two_vote_over: usize,
        one_vote_over: usize,
        no_discrepancy: usize,
        collisions: usize,
        expected: ExpectedModel,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct CheckModel {
    pub recomputed: f64,
    pub reported: Option<f64>,
    pub agrees: Option<bool>,
    pub meets_risk_limit: bool,
}

// ===== Builders =====

fn candidates(v: &[Candidate]) -> Vec<CandidateModel> {
    v.iter().map(|c| CandidateModel { name: c.name.clone(), votes: c.votes }).collect()
}

fn polling_model(o: &PollingOutcome) -> RiskModel {
    RiskModel::Polling {
        tot_p: o.tot_p,
        seq_p: o.seq_p,
        stop_index: o.stop_index,
        draws: o.draws,
        phantoms: o.phantoms,
        unrecognized: o.unrecognized,
        collisions: o.collisions,
        pairs: o
            .pairs
            .iter()
            .map(|p| PairModel {
                winner: p.winner.clone(),
                loser: p.loser.clone(),
                share: p.share,
                t: p.t,
                total_t: p.total_t,
                finished_at: p.finished_at,
            })
            .collect(),
    }
}

fn comparison_model(o: &ComparisonOutcome) -> RiskModel {
    RiskModel::Comparison {
        p_value: o.p_value.to_string(),
        error_bound: o.error_bound.to_string(),
        audited: o.audited,
        unaudited: o.unaudited,
        two_vote_over: o.counts.two_vote_over,
        one_vote_over: o.counts.one_vote_over,
        no_discrepancy: o.counts.none,
        collisions: o.collisions,
        expected: ExpectedModel {
            o1: o.expected.o1.to_string(),
            o2: o.expected.o2.to_string(),
            u1: o.expected.u1.to_string(),
            u2: o.expected.u2.to_string(),
        },
    }
}

fn check_model(c: &PValueCheck) -> CheckModel {
    CheckModel {
        recomputed: c.recomputed,
        reported: c.reported,
        agrees: c.agrees,
        meets_risk_limit: c.meets_risk_limit,
    }
}

fn contest_model(c: &ContestVerification) -> ContestModel {
    ContestModel {
        name: c.contest.name.clone(),
        targeted: c.contest.targeted,
        worst_winner: c.margin.worst_winner.name.clone(),
        best_loser: c.margin.best_loser.name.clone(),
        winners: candidates(&c.margin.winners),
        losers: candidates(&c.margin.losers),
        margin_votes: c.margin.diluted.vote_gap,
        total_ballots_cast: c.margin.diluted.ballots_cast,
        diluted_margin: c.margin.diluted.fraction(),
        ballots_with_contest: c.ballots_with_contest,
        risk: c.risk.as_ref().map(|r| match r {
            RiskCheck::Polling(o) => polling_model(o),
            RiskCheck::Comparison(o) => comparison_model(o),
        }),
        check: c.check.as_ref().map(check_model),
    }
}

/// One file's model; `path` is used when the verification carries no source.
pub fn file_model(path: &std::path::Path, outcome: &Result<Verification, PipelineError>) -> FileModel {
    match outcome {
        Ok(v) => {
            let (status, audit_type) = match &v.audit {
                AuditStatus::Verified(t) => (FileStatus::Verified, t.as_tag().to_string()),
                AuditStatus::Unsupported(tag) => (FileStatus::Unsupported, tag.clone()),
            };
            FileModel {
                path: v.source.as_deref().unwrap_or(path).display().to_string(),
                status,
                error: None,
                input_sha256: v.input_sha256.clone(),
                election_name: v.election.name.clone(),
                state: v.election.state.clone(),
                audit_type,
                risk_limit: Some(v.settings.risk_limit),
                contests: v.contests.iter().map(contest_model).collect(),
            }
        }
        Err(e) => FileModel {
            path: path.display().to_string(),
            status: FileStatus::Failed,
            error: Some(e.to_string()),
            input_sha256: None,
            election_name: String::new(),
            state: String::new(),
            audit_type: String::new(),
            risk_limit: None,
            contests: Vec::new(),
        },
    }
}

fn params_model(params: &VerifyParams) -> ParamsModel {
    let (phantom_policy, phantom_seed) = match params.phantom_policy {
        PhantomPolicy::WorstCase => ("worst_case", None),
        PhantomPolicy::Simulate { seed } => ("simulate", Some(seed)),
    };
    ParamsModel {
        phantom_policy: phantom_policy.to_string(),
        phantom_seed,
        ticket_epsilon: params.ticket_epsilon,
        p_value_tolerance: params.p_value_tolerance,
        gamma: params.comparison.gamma.to_string(),
    }
}

/// Build the run model from per-file outcomes (in command-line order).
pub fn build_model(files: &[(PathBuf, Result<Verification, PipelineError>)], params: &VerifyParams) -> RunModel {
    let engine = engine_identifiers();
    RunModel {
        engine: EngineModel { name: engine.name, version: engine.version },
        params: params_model(params),
        files: files.iter().map(|(p, r)| file_model(p, r)).collect(),
    }
}

// ===== Test fixtures =====
