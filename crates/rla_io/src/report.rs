//! Structured, schema-free view of one audit report file.
//!
//! Two section shapes exist:
//! - **packed** (ELECTION INFO, AUDIT SETTINGS): one `key → value` map;
//! - **tabular** (the other four): a header row plus records in file order.
//!
//! Records are lenient: a short data row simply lacks keys. Missing keys are
//! detected at first use (see `rla_pipeline::extract`), never here.

use std::collections::BTreeMap;
use std::fmt;

/// The six recognized report sections, in canonical file order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionKind {
    ElectionInfo,
    Contests,
    AuditSettings,
    AuditBoards,
    Rounds,
    SampledBallots,
}

impl SectionKind {
    pub const ALL: [SectionKind; 6] = [
        SectionKind::ElectionInfo,
        SectionKind::Contests,
        SectionKind::AuditSettings,
        SectionKind::AuditBoards,
        SectionKind::Rounds,
        SectionKind::SampledBallots,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SectionKind::ElectionInfo => "ELECTION INFO",
            SectionKind::Contests => "CONTESTS",
            SectionKind::AuditSettings => "AUDIT SETTINGS",
            SectionKind::AuditBoards => "AUDIT BOARDS",
            SectionKind::Rounds => "ROUNDS",
            SectionKind::SampledBallots => "SAMPLED BALLOTS",
        }
    }

    /// Exact match against a normalized line.
    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.label() == s)
    }

    /// Packed sections carry `key,value` lines instead of a header + rows.
    pub fn is_packed(self) -> bool {
        matches!(self, SectionKind::ElectionInfo | SectionKind::AuditSettings)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One data row of a tabular section: column name → cell, in header order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair header columns with row tokens; the shorter side wins.
    pub fn zip(header: &[String], tokens: Vec<String>) -> Self {
        let mut rec = Record::new();
        for (key, value) in header.iter().zip(tokens) {
            rec.insert(key.clone(), value);
        }
        rec
    }

    /// Insert or overwrite (a repeated column name keeps its last value).
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Header + records of a tabular section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    /// Most recent header row seen for this section.
    pub header: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parsed report. Built once per input file, read-only afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub election_info: BTreeMap<String, String>,
    pub audit_settings: BTreeMap<String, String>,
    pub contests: Table,
    pub audit_boards: Table,
    pub rounds: Table,
    pub sampled_ballots: Table,
}

impl Report {
    /// Map of a packed section; `None` for tabular kinds.
    pub fn packed(&self, kind: SectionKind) -> Option<&BTreeMap<String, String>> {
        match kind {
            SectionKind::ElectionInfo => Some(&self.election_info),
            SectionKind::AuditSettings => Some(&self.audit_settings),
            _ => None,
        }
    }

    /// Table of a tabular section; `None` for packed kinds.
    pub fn table(&self, kind: SectionKind) -> Option<&Table> {
        match kind {
            SectionKind::Contests => Some(&self.contests),
            SectionKind::AuditBoards => Some(&self.audit_boards),
            SectionKind::Rounds => Some(&self.rounds),
            SectionKind::SampledBallots => Some(&self.sampled_ballots),
            _ => None,
        }
    }

    pub(crate) fn packed_mut(&mut self, kind: SectionKind) -> Option<&mut BTreeMap<String, String>> {
        match kind {
            SectionKind::ElectionInfo => Some(&mut self.election_info),
            SectionKind::AuditSettings => Some(&mut self.audit_settings),
            _ => None,
        }
    }

    pub(crate) fn table_mut(&mut self, kind: SectionKind) -> Option<&mut Table> {
        match kind {
            SectionKind::Contests => Some(&mut self.contests),
            SectionKind::AuditBoards => Some(&mut self.audit_boards),
            SectionKind::Rounds => Some(&mut self.rounds),
            SectionKind::SampledBallots => Some(&mut self.sampled_ballots),
            _ => None,
        }
    }
}
