//! crates/rla_pipeline/src/extract.rs
//! EXTRACT stage: lenient string records → typed entities.
//!
//! The parser never validates; this is where an absent column or a bad
//! number becomes a typed error naming its section and key.

use rla_core::{
    entities::{parse_risk_limit, parse_ticket_numbers},
    AuditSettings, Contest, ElectionInfo, Round, SampledBallot, TicketColumn, AUDITED_FLAG,
};
use rla_io::{Record, Report, SectionKind};

use crate::PipelineError;

// ----- Column names ----------------------------------------------------------------------------

pub const ELECTION_NAME: &str = "Election Name";
pub const STATE: &str = "State";
pub const RISK_LIMIT: &str = "Risk Limit";
pub const AUDIT_TYPE: &str = "Audit Type";

pub const CONTEST_NAME: &str = "Contest Name";
pub const TARGETED: &str = "Targeted?";
pub const NUMBER_OF_WINNERS: &str = "Number of Winners";
pub const TOTAL_BALLOTS_CAST: &str = "Total Ballots Cast";
pub const TABULATED_VOTES: &str = "Tabulated Votes";

pub const ROUND_NUMBER: &str = "Round Number";
pub const P_VALUE: &str = "P-Value";

pub const AUDITED: &str = "Audited?";
pub const TICKET_NUMBERS: &str = "Ticket Numbers";
pub const AUDIT_RESULT_PREFIX: &str = "Audit Result:";
pub const CVR_RESULT_PREFIX: &str = "CVR Result:";

const TARGETED_FLAG: &str = "Targeted";

// ----- Field access ----------------------------------------------------------------------------

fn field<'r>(rec: &'r Record, section: SectionKind, key: &str) -> Result<&'r str, PipelineError> {
    rec.get(key).ok_or_else(|| PipelineError::MissingField {
        section: section.label(),
        key: key.to_string(),
    })
}

fn number<T: std::str::FromStr>(raw: &str, section: SectionKind, key: &str) -> Result<T, PipelineError> {
    raw.trim().parse::<T>().map_err(|_| PipelineError::Number {
        section: section.label(),
        key: key.to_string(),
        value: raw.to_string(),
    })
}

// ----- Sections --------------------------------------------------------------------------------

/// Informational only; absent keys become empty strings.
pub fn election_info(report: &Report) -> ElectionInfo {
    let get = |k: &str| report.election_info.get(k).cloned().unwrap_or_default();
    ElectionInfo { name: get(ELECTION_NAME), state: get(STATE) }
}

pub fn audit_settings(report: &Report) -> Result<AuditSettings, PipelineError> {
    let section = SectionKind::AuditSettings;
    let get = |k: &str| {
        report
            .audit_settings
            .get(k)
            .ok_or_else(|| PipelineError::MissingField { section: section.label(), key: k.to_string() })
    };
    let risk_raw = get(RISK_LIMIT)?;
    let risk_limit = parse_risk_limit(risk_raw).map_err(|_| PipelineError::Number {
        section: section.label(),
        key: RISK_LIMIT.to_string(),
        value: risk_raw.clone(),
    })?;
    let audit_type_tag = get(AUDIT_TYPE)?.trim().to_string();
    Ok(AuditSettings { risk_limit, audit_type_tag })
}

pub fn contest(rec: &Record) -> Result<Contest, PipelineError> {
    let s = SectionKind::Contests;
    Ok(Contest {
        name: field(rec, s, CONTEST_NAME)?.to_string(),
        targeted: field(rec, s, TARGETED)?.trim() == TARGETED_FLAG,
        num_winners: number(field(rec, s, NUMBER_OF_WINNERS)?, s, NUMBER_OF_WINNERS)?,
        total_ballots_cast: number(field(rec, s, TOTAL_BALLOTS_CAST)?, s, TOTAL_BALLOTS_CAST)?,
        tabulated_votes: field(rec, s, TABULATED_VOTES)?.to_string(),
    })
}

pub fn contests(report: &Report) -> Result<Vec<Contest>, PipelineError> {
    report.contests.records.iter().map(contest).collect()
}

pub fn round(rec: &Record) -> Result<Round, PipelineError> {
    let s = SectionKind::Rounds;
    let p_raw = field(rec, s, P_VALUE)?;
    let p_value = if p_raw.trim().is_empty() {
        None
    } else {
        Some(number::<f64>(p_raw, s, P_VALUE)?)
    };
    Ok(Round {
        round_number: number(field(rec, s, ROUND_NUMBER)?, s, ROUND_NUMBER)?,
        contest: field(rec, s, CONTEST_NAME)?.to_string(),
        p_value,
    })
}

pub fn rounds(report: &Report) -> Result<Vec<Round>, PipelineError> {
    report.rounds.records.iter().map(round).collect()
}

/// One SAMPLED BALLOTS row.
///
/// Ticket columns are `Ticket Numbers` (report-wide) or
/// `Ticket Numbers: <contest>`. Result columns are keyed by the contest
/// name after the prefix.
pub fn sampled_ballot(rec: &Record) -> Result<SampledBallot, PipelineError> {
    let s = SectionKind::SampledBallots;
    let mut ballot = SampledBallot {
        audited: field(rec, s, AUDITED)?.trim() == AUDITED_FLAG,
        ..SampledBallot::default()
    };

    for (key, value) in rec.iter() {
        if let Some(rest) = key.strip_prefix(TICKET_NUMBERS) {
            let contest = match rest.trim_start().strip_prefix(':') {
                Some(name) => Some(name.trim().to_string()),
                None if rest.trim().is_empty() => None,
                // e.g. "Ticket Numbers Extra"; not a ticket column.
                None => continue,
            };
            let tickets = parse_ticket_numbers(value).map_err(|_| PipelineError::Number {
                section: s.label(),
                key: key.to_string(),
                value: value.to_string(),
            })?;
            ballot.tickets.push(TicketColumn { contest, tickets });
        } else if let Some(name) = key.strip_prefix(AUDIT_RESULT_PREFIX) {
            ballot.audit_results.insert(name.trim().to_string(), value.trim().to_string());
        } else if let Some(name) = key.strip_prefix(CVR_RESULT_PREFIX) {
            ballot.cvr_results.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    Ok(ballot)
}

pub fn sampled_ballots(report: &Report) -> Result<Vec<SampledBallot>, PipelineError> {
    report.sampled_ballots.records.iter().map(sampled_ballot).collect()
}

// ----- Tests -----------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rla_io::parse_lines;

    const REPORT: &str = "\
######## ELECTION INFO ########
Election Name,County General
State,CA

######## CONTESTS ########
Contest Name,Targeted?,Number of Winners,Votes Allowed,Total Ballots Cast,Tabulated Votes
Mayor,Targeted,1,1,1000,Alice:600;Bob:400
Measure A,Opportunistic,1,1,1000,Yes:700;No:300

######## AUDIT SETTINGS ########
Audit Name,Demo
Audit Type,BALLOT_POLLING
Risk Limit,10%

######## ROUNDS ########
Round Number,Contest Name,Targeted?,Sample Size,Risk Limit Met?,P-Value
1,Mayor,Targeted,3,No,0.52
1,Measure A,Opportunistic,3,No,

######## SAMPLED BALLOTS ########
Jurisdiction Name,Batch Name,Ballot Position,Ticket Numbers: Mayor,Audited?,Audit Result: Mayor,Audit Result: Measure A
J1,B1,1,\"0.11,0.52\",AUDITED,Alice,Yes
J1,B1,2,0.33,NOT_AUDITED,,
";

    fn report() -> Report {
        parse_lines(REPORT.lines())
    }

    #[test]
    fn extracts_every_section() {
        let r = report();
        assert_eq!(election_info(&r), ElectionInfo { name: "County General".into(), state: "CA".into() });

        let settings = audit_settings(&r).unwrap();
        assert!((settings.risk_limit - 0.1).abs() < 1e-12);
        assert_eq!(settings.audit_type_tag, "BALLOT_POLLING");

        let cs = contests(&r).unwrap();
        assert_eq!(cs.len(), 2);
        assert!(cs[0].targeted);
        assert!(!cs[1].targeted);
        assert_eq!(cs[0].total_ballots_cast, 1000);

        let rs = rounds(&r).unwrap();
        assert_eq!(rs[0].p_value, Some(0.52));
        assert_eq!(rs[1].p_value, None);
    }

    #[test]
    fn ballots_carry_tickets_and_results() {
        let bs = sampled_ballots(&report()).unwrap();
        assert_eq!(bs.len(), 2);
        assert!(bs[0].audited);
        assert_eq!(bs[0].tickets_for("Mayor"), &[0.11, 0.52]);
        assert_eq!(bs[0].audit_result("Measure A"), Some("Yes"));
        assert!(!bs[1].audited);
        assert_eq!(bs[1].audit_result("Mayor"), Some(""));
    }

    #[test]
    fn missing_column_names_section_and_key() {
        let r = parse_lines(
            "CONTESTS\nContest Name,Targeted?,Number of Winners\nMayor,Targeted,1\n".lines(),
        );
        match contests(&r) {
            Err(PipelineError::MissingField { section, key }) => {
                assert_eq!(section, "CONTESTS");
                assert_eq!(key, TOTAL_BALLOTS_CAST);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn bad_numbers_are_typed_errors() {
        let r = parse_lines(
            "CONTESTS\nContest Name,Targeted?,Number of Winners,Total Ballots Cast,Tabulated Votes\nMayor,Targeted,one,10,A:1;B:2\n"
                .lines(),
        );
        assert!(matches!(
            contests(&r),
            Err(PipelineError::Number { ref key, .. }) if key == NUMBER_OF_WINNERS
        ));

        let r = parse_lines("SAMPLED BALLOTS\nTicket Numbers,Audited?\nabc,AUDITED\n".lines());
        assert!(matches!(sampled_ballots(&r), Err(PipelineError::Number { .. })));

        let r = parse_lines("AUDIT SETTINGS\nRisk Limit,150%\nAudit Type,BALLOT_POLLING\n".lines());
        assert!(matches!(audit_settings(&r), Err(PipelineError::Number { .. })));
    }

    #[test]
    fn global_ticket_column_and_cvr_results() {
        let r = parse_lines(
            "SAMPLED BALLOTS\nTicket Numbers,Audited?,Audit Result: Mayor,CVR Result: Mayor\n0.4,AUDITED,Bob,Alice\n"
                .lines(),
        );
        let bs = sampled_ballots(&r).unwrap();
        assert_eq!(bs[0].tickets_for("Mayor"), &[0.4]);
        assert_eq!(bs[0].tickets_for("Anything"), &[0.4]);
        assert_eq!(bs[0].cvr_result("Mayor"), Some("Alice"));
    }

    #[test]
    fn short_row_surfaces_missing_audited_flag() {
        let r = parse_lines("SAMPLED BALLOTS\nTicket Numbers,Audited?\n0.4\n".lines());
        assert!(matches!(
            sampled_ballots(&r),
            Err(PipelineError::MissingField { ref key, .. }) if key == AUDITED
        ));
    }
}
