//! render_text.rs: human-readable summary, one block per file.
//!
//! Layout (tabs are literal):
//!
//! ```text
//! Verifier for VotingWorks' Arlo Audit Reports
//!
//! Verifying report <path>, for election <name> in <state>
//!
//! 	Found <n> contests:
//! 		<contest>:
//! 			Worst Winner: …
//! ```

use std::fmt::Write as _;

use crate::{CheckModel, ContestModel, FileModel, FileStatus, RiskModel, RunModel};

pub const BANNER: &str = "Verifier for VotingWorks' Arlo Audit Reports";

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

fn percent(m: Option<f64>) -> String {
    match m {
        Some(f) => format!("{:2.1}%", f * 100.0),
        None => "n/a".to_string(),
    }
}

fn write_risk(out: &mut String, risk: &RiskModel) {
    match risk {
        RiskModel::Polling { tot_p, seq_p, stop_index, draws, phantoms, unrecognized, .. } => {
            let _ = writeln!(out, "\t\t\tBallot polling: {draws} draws, {phantoms} phantom, {unrecognized} unrecognized");
            let _ = writeln!(out, "\t\t\t  p (all draws): {tot_p:.6}   p (stopped): {seq_p:.6}");
            match stop_index {
                Some(n) => {
                    let _ = writeln!(out, "\t\t\t  Risk limit first met at draw {n}");
                }
                None => {
                    let _ = writeln!(out, "\t\t\t  Risk limit not met by any prefix of the sample");
                }
            }
        }
        RiskModel::Comparison {
            p_value,
            error_bound,
            audited,
            unaudited,
            two_vote_over,
            one_vote_over,
            ..
        } => {
            let _ = writeln!(out, "\t\t\tBallot comparison: {audited} audited, {unaudited} not audited");
            let _ = writeln!(
                out,
                "\t\t\t  Overstatements: {two_vote_over} two-vote, {one_vote_over} one-vote   U: {error_bound}"
            );
            let _ = writeln!(out, "\t\t\t  p: {p_value}");
        }
    }
}

fn write_check(out: &mut String, check: &CheckModel) {
    let reported = match (check.reported, check.agrees) {
        (Some(r), Some(true)) => format!("{r:.6} (matches)"),
        (Some(r), _) => format!("{r:.6} (MISMATCH)"),
        (None, _) => "none".to_string(),
    };
    let _ = writeln!(
        out,
        "\t\t\tRecomputed p-value: {:.6}   Reported: {}   Risk limit met? {}",
        check.recomputed,
        reported,
        yes_no(check.meets_risk_limit)
    );
}

fn write_contest(out: &mut String, c: &ContestModel) {
    let _ = writeln!(out, "\t\t{}:", c.name);
    let _ = writeln!(out, "\t\t\tWorst Winner: {:20}", c.worst_winner);
    let _ = writeln!(out, "\t\t\tBest Loser: {:20}", c.best_loser);
    let _ = writeln!(out, "\t\t\tDiluted margin: {}", percent(c.diluted_margin));
    let _ = writeln!(out, "\t\t\tTargeted? {}", yes_no(c.targeted));
    if let Some(risk) = &c.risk {
        let _ = writeln!(out, "\t\t\tSampled ballots with contest: {}", c.ballots_with_contest);
        write_risk(out, risk);
    }
    if let Some(check) = &c.check {
        write_check(out, check);
    }
}

fn write_file(out: &mut String, f: &FileModel) {
    if let FileStatus::Failed = f.status {
        let _ = writeln!(out, "Could not verify report {}: {}\n", f.path, f.error.as_deref().unwrap_or("unknown error"));
        return;
    }
    let _ = writeln!(out, "Verifying report {}, for election {} in {}\n", f.path, f.election_name, f.state);
    if let FileStatus::Unsupported = f.status {
        let _ = writeln!(out, "\tUnsupported audit type {:?}; risk not recomputed.", f.audit_type);
    }
    let _ = writeln!(out, "\tFound {} contests:", f.contests.len());
    for c in &f.contests {
        write_contest(out, c);
    }
    out.push('\n');
}

/// Render the whole run as plain text.
pub fn render_text(model: &RunModel) -> String {
    let mut out = String::new();
    out.push_str(BANNER);
    out.push_str("\n\n");
    for f in &model.files {
        write_file(&mut out, f);
    }
    out
}
