//! crates/rla_pipeline/src/verify.rs
//! VERIFY stage: one report in, one `Verification` out.
//!
//! Order of work is fixed: settings → contests → margins (all contests) →
//! audit type. An unsupported audit type stops there and is reported as a
//! status, not an error. Otherwise rounds and sampled ballots are extracted
//! and each contest goes through the audit method chosen once for the file.

use std::path::{Path, PathBuf};

use num_traits::ToPrimitive;
use rla_algo::{
    comparison_risk, compute_margin, polling_risk, ComparisonBallot, ComparisonOutcome,
    ContestMargin, Draw, Observation, PhantomSource, PollingOutcome,
};
use rla_core::{
    AuditSettings, AuditType, ComparisonParams, Contest, ElectionInfo, PhantomPolicy, SampledBallot,
    VerifyParams, CONTEST_NOT_ON_BALLOT,
};
use rla_io::{loader, parse_lines, Report};
use tracing::{debug, info, warn};

use crate::compare::{reported_p_value, PValueCheck};
use crate::extract;
use crate::PipelineError;

// ----- Audit method ----------------------------------------------------------------------------

/// The statistic applied to every contest of a file.
#[derive(Clone, Debug, PartialEq)]
pub enum AuditMethod {
    Polling { risk_limit: f64, phantom: PhantomPolicy, epsilon: f64 },
    Comparison { params: ComparisonParams, epsilon: f64 },
}

impl AuditMethod {
    pub fn new(audit_type: AuditType, settings: &AuditSettings, params: &VerifyParams) -> Self {
        match audit_type {
            AuditType::BallotPolling => AuditMethod::Polling {
                risk_limit: settings.risk_limit,
                phantom: params.phantom_policy,
                epsilon: params.ticket_epsilon,
            },
            AuditType::BallotComparison => AuditMethod::Comparison {
                params: params.comparison,
                epsilon: params.ticket_epsilon,
            },
        }
    }

    /// Risk for one contest. Each call starts a fresh phantom stream.
    pub fn assess(&self, margin: &ContestMargin, ballots: &[SampledBallot]) -> Result<RiskCheck, PipelineError> {
        let name = margin.contest.as_str();
        match self {
            AuditMethod::Polling { risk_limit, phantom, epsilon } => {
                let draws = ballots.iter().flat_map(|b| {
                    let observation = if b.audited {
                        Observation::Audited(b.audit_result(name).unwrap_or(""))
                    } else {
                        Observation::Phantom
                    };
                    b.tickets_for(name).iter().map(move |&ticket| Draw { ticket, observation })
                });
                let mut source = PhantomSource::from_policy(phantom);
                let outcome = polling_risk(margin, draws, *risk_limit, *epsilon, &mut source);
                if outcome.phantoms > 0 {
                    warn!(contest = name, phantoms = outcome.phantoms, "unaudited draws charged as phantoms");
                }
                if outcome.unrecognized > 0 {
                    warn!(contest = name, count = outcome.unrecognized, "audited draws naming no candidate");
                }
                if outcome.collisions > 0 {
                    warn!(contest = name, collisions = outcome.collisions, "duplicate ticket numbers perturbed");
                }
                Ok(RiskCheck::Polling(outcome))
            }
            AuditMethod::Comparison { params, epsilon } => {
                let sampled = ballots.iter().filter_map(|b| {
                    let ticket = *b.tickets_for(name).first()?;
                    Some(ComparisonBallot {
                        ticket,
                        cvr: b.cvr_result(name).unwrap_or(""),
                        audit: b.audited.then(|| b.audit_result(name).unwrap_or("")),
                    })
                });
                let outcome = comparison_risk(margin, sampled, params, *epsilon)?;
                if outcome.unaudited > 0 {
                    warn!(contest = name, unaudited = outcome.unaudited, "sampled ballots not yet audited");
                }
                if outcome.collisions > 0 {
                    warn!(contest = name, collisions = outcome.collisions, "duplicate ticket numbers perturbed");
                }
                Ok(RiskCheck::Comparison(outcome))
            }
        }
    }
}

/// Engine output, one variant per audit method.
#[derive(Clone, Debug, PartialEq)]
pub enum RiskCheck {
    Polling(PollingOutcome),
    Comparison(ComparisonOutcome),
}

impl RiskCheck {
    /// Attained risk as a float (uncapped).
    pub fn p_value(&self) -> f64 {
        match self {
            RiskCheck::Polling(o) => o.tot_p,
            RiskCheck::Comparison(o) => o.p_value.to_f64().unwrap_or(f64::INFINITY),
        }
    }
}

// ----- Results ---------------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuditStatus {
    Verified(AuditType),
    /// Tag as found in AUDIT SETTINGS.
    Unsupported(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContestVerification {
    pub contest: Contest,
    pub margin: ContestMargin,
    /// Sampled ballots drawn for this contest that were not marked as lacking it.
    pub ballots_with_contest: usize,
    /// `None` when the audit type is unsupported.
    pub risk: Option<RiskCheck>,
    pub check: Option<PValueCheck>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Verification {
    pub source: Option<PathBuf>,
    pub input_sha256: Option<String>,
    pub election: ElectionInfo,
    pub settings: AuditSettings,
    pub audit: AuditStatus,
    pub contests: Vec<ContestVerification>,
}

impl Verification {
    /// Any contest whose recomputed p disagrees with the reported one.
    pub fn has_mismatch(&self) -> bool {
        self.contests.iter().any(|c| c.check.is_some_and(|k| k.is_mismatch()))
    }
}

// ----- Entry points ----------------------------------------------------------------------------

fn ballots_with_contest(ballots: &[SampledBallot], contest: &str) -> usize {
    ballots
        .iter()
        .filter(|b| !b.tickets_for(contest).is_empty())
        .filter(|b| b.audit_result(contest) != Some(CONTEST_NOT_ON_BALLOT))
        .count()
}

/// Verify an already-parsed report.
pub fn verify_report(report: &Report, params: &VerifyParams) -> Result<Verification, PipelineError> {
    let election = extract::election_info(report);
    let settings = extract::audit_settings(report)?;
    let contests = extract::contests(report)?;

    let margins = contests
        .iter()
        .map(compute_margin)
        .collect::<Result<Vec<_>, _>>()?;

    let audit_type = match settings.audit_type() {
        Ok(t) => t,
        Err(_) => {
            warn!(audit_type = %settings.audit_type_tag, "unsupported audit type; risk not computed");
            let contests = contests
                .into_iter()
                .zip(margins)
                .map(|(contest, margin)| ContestVerification {
                    contest,
                    margin,
                    ballots_with_contest: 0,
                    risk: None,
                    check: None,
                })
                .collect();
            return Ok(Verification {
                source: None,
                input_sha256: None,
                election,
                audit: AuditStatus::Unsupported(settings.audit_type_tag.clone()),
                settings,
                contests,
            });
        }
    };

    let rounds = extract::rounds(report)?;
    let ballots = extract::sampled_ballots(report)?;
    let method = AuditMethod::new(audit_type, &settings, params);

    let mut out = Vec::with_capacity(contests.len());
    for (contest, margin) in contests.into_iter().zip(margins) {
        let risk = method.assess(&margin, &ballots)?;
        let check = PValueCheck::new(
            risk.p_value(),
            reported_p_value(&rounds, &contest.name),
            settings.risk_limit,
            params.p_value_tolerance,
        );
        debug!(contest = %contest.name, p = check.recomputed, reported = ?check.reported, "contest verified");
        out.push(ContestVerification {
            ballots_with_contest: ballots_with_contest(&ballots, &contest.name),
            contest,
            margin,
            risk: Some(risk),
            check: Some(check),
        });
    }

    Ok(Verification {
        source: None,
        input_sha256: None,
        election,
        audit: AuditStatus::Verified(audit_type),
        settings,
        contests: out,
    })
}

/// Parse `lines` and verify.
pub fn verify_lines<I, S>(lines: I, params: &VerifyParams) -> Result<Verification, PipelineError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    verify_report(&parse_lines(lines), params)
}

/// Load a report file, verify it, and attach its provenance.
pub fn verify_path(path: &Path, params: &VerifyParams) -> Result<Verification, PipelineError> {
    let loaded = loader::load_report(path)?;
    let mut verification = verify_report(&loaded.report, params)?;
    verification.source = Some(loaded.source);
    verification.input_sha256 = Some(loaded.sha256);
    info!(
        path = %path.display(),
        contests = verification.contests.len(),
        mismatch = verification.has_mismatch(),
        "report verified"
    );
    Ok(verification)
}

// ----- Tests -----------------------------------------------------------------------------------
