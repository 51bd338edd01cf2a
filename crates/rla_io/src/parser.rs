//! Lenient sectioned-report parser.
//!
//! Each line is trimmed and stripped of `#` decoration on both ends, so both
//! `CONTESTS` and `######## CONTESTS ########` are labels. Per section the
//! parser walks a three-state machine:
//!
//! ```text
//!   SECTION_LABEL --(tabular)--> HEADER --(next non-blank line)--> DATA
//!   SECTION_LABEL --(packed)---------------------------------------> DATA
//! ```
//!
//! - HEADER lines are split on plain commas into column names.
//! - DATA lines go through the quoted-CSV tokenizer. Packed sections merge
//!   `key,value` into their map; tabular sections zip against the header.
//! - Blank lines are ignored everywhere.
//!
//! No schema validation: short rows produce records with missing keys.

use tracing::{debug, warn};

use crate::csv_line;
use crate::report::{Record, Report, SectionKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineState {
    Header,
    Data,
}

/// Incremental parser; feed lines, then `finish`.
#[derive(Debug)]
pub struct ReportParser {
    report: Report,
    section: SectionKind,
    state: LineState,
    header: Vec<String>,
    line_no: usize,
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportParser {
    /// Lines before the first label belong to ELECTION INFO.
    pub fn new() -> Self {
        Self {
            report: Report::default(),
            section: SectionKind::ElectionInfo,
            state: LineState::Data,
            header: Vec::new(),
            line_no: 0,
        }
    }

    pub fn feed(&mut self, raw: &str) {
        self.line_no += 1;
        let line = normalize_line(raw);

        if let Some(kind) = SectionKind::from_label(line) {
            self.section = kind;
            self.header.clear();
            self.state = if kind.is_packed() { LineState::Data } else { LineState::Header };
            return;
        }

        if line.is_empty() {
            return;
        }

        match self.state {
            LineState::Header => {
                self.header = line.split(',').map(str::to_string).collect();
                if let Some(table) = self.report.table_mut(self.section) {
                    table.header = self.header.clone();
                }
                self.state = LineState::Data;
            }
            LineState::Data => self.push_data(line),
        }
    }

    fn push_data(&mut self, line: &str) {
        let mut tokens = csv_line::tokenize(line);
        let section = self.section;

        if let Some(map) = self.report.packed_mut(section) {
            if tokens.len() < 2 {
                warn!(line = self.line_no, %section, "packed line without a value");
            }
            let value = if tokens.len() > 1 { tokens.swap_remove(1) } else { String::new() };
            let key = tokens.swap_remove(0);
            map.insert(key, value);
            return;
        }

        if tokens.len() < self.header.len() {
            debug!(
                line = self.line_no,
                %section,
                got = tokens.len(),
                want = self.header.len(),
                "short data row"
            );
        }
        let record = Record::zip(&self.header, tokens);
        if let Some(table) = self.report.table_mut(section) {
            table.records.push(record);
        }
    }

    pub fn finish(self) -> Report {
        self.report
    }
}

/// Trim, strip `#` on both ends, trim again.
pub fn normalize_line(raw: &str) -> &str {
    raw.trim().trim_matches('#').trim()
}

/// Parse a whole report from an already-opened line source.
pub fn parse_lines<I, S>(lines: I) -> Report
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = ReportParser::new();
    for line in lines {
        parser.feed(line.as_ref());
    }
    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
######## ELECTION INFO ########
Election Name,Spring Primary
State,CA

######## CONTESTS ########
Contest Name,Targeted?,Number of Winners,Total Ballots Cast,Tabulated Votes
Mayor,Targeted,1,1200,Alice:600;Bob:400

######## AUDIT SETTINGS ########
Risk Limit,10%
Audit Type,BALLOT_POLLING

######## ROUNDS ########
Round Number,Contest Name,P-Value
1,Mayor,0.04

######## SAMPLED BALLOTS ########
Ticket Numbers: Mayor,Audited?,Audit Result: Mayor
\"0.11,0.52\",AUDITED,Alice
0.73,NOT_AUDITED,
";

    #[test]
    fn parses_all_sections() {
        let r = parse_lines(SAMPLE.lines());
        assert_eq!(r.election_info.get("Election Name").map(String::as_str), Some("Spring Primary"));
        assert_eq!(r.audit_settings.get("Risk Limit").map(String::as_str), Some("10%"));
        assert_eq!(r.contests.len(), 1);
        assert_eq!(r.contests.records[0].get("Tabulated Votes"), Some("Alice:600;Bob:400"));
        assert_eq!(r.rounds.records[0].get("P-Value"), Some("0.04"));
        assert_eq!(r.sampled_ballots.len(), 2);
        assert_eq!(r.sampled_ballots.records[0].get("Ticket Numbers: Mayor"), Some("0.11,0.52"));
        assert_eq!(r.sampled_ballots.records[1].get("Audit Result: Mayor"), Some(""));
        assert!(r.audit_boards.is_empty());
    }

    #[test]
    fn lines_before_any_label_are_election_info() {
        let r = parse_lines(["Election Name,General", "# State,NV #"]);
        assert_eq!(r.election_info.get("Election Name").map(String::as_str), Some("General"));
        assert_eq!(r.election_info.get("State").map(String::as_str), Some("NV"));
    }

    #[test]
    fn short_rows_lack_keys() {
        let r = parse_lines(["CONTESTS", "Contest Name,Targeted?,Number of Winners", "Mayor,Targeted"]);
        let rec = &r.contests.records[0];
        assert_eq!(rec.get("Targeted?"), Some("Targeted"));
        assert_eq!(rec.get("Number of Winners"), None);
    }

    #[test]
    fn blank_line_after_label_does_not_become_header() {
        let r = parse_lines(["ROUNDS", "", "Round Number,Contest Name", "1,Mayor"]);
        assert_eq!(r.rounds.header, vec!["Round Number", "Contest Name"]);
        assert_eq!(r.rounds.records[0].get("Contest Name"), Some("Mayor"));
    }

    #[test]
    fn repeated_section_takes_new_header() {
        let r = parse_lines([
            "ROUNDS", "A,B", "1,2",
            "CONTESTS", "Contest Name", "X",
            "ROUNDS", "C", "3",
        ]);
        assert_eq!(r.rounds.len(), 2);
        assert_eq!(r.rounds.records[0].get("A"), Some("1"));
        assert_eq!(r.rounds.records[1].get("C"), Some("3"));
        assert_eq!(r.rounds.header, vec!["C"]);
    }

    #[test]
    fn packed_duplicate_keys_overwrite() {
        let r = parse_lines(["AUDIT SETTINGS", "Risk Limit,10%", "Risk Limit,5%", "Audit Type"]);
        assert_eq!(r.audit_settings.get("Risk Limit").map(String::as_str), Some("5%"));
        assert_eq!(r.audit_settings.get("Audit Type").map(String::as_str), Some(""));
    }
}
