//! crates/rla_algo/src/margin.rs
//! Diluted margin from a contest's tabulated vote string.
//!
//! Tabulation format: `Name1:Votes1;Name2:Votes2;...`. Candidates are sorted
//! by votes descending with a *stable* sort, so equal counts keep their order
//! of appearance. The first `num_winners` are winners, the rest losers.
//!
//! Diluted margin = (worst winner votes − best loser votes) / total ballots cast.
//! The denominator counts every ballot cast, not only those bearing the contest.

use rla_core::{Candidate, Contest};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MarginError {
    #[error("contest {contest}: tabulation entry {entry:?} has no ':' separator")]
    MalformedEntry { contest: String, entry: String },
    #[error("contest {contest}: vote count {value:?} for {candidate:?} is not a non-negative integer")]
    VoteCount { contest: String, candidate: String, value: String },
    #[error("contest {contest}: number of winners must be at least 1")]
    ZeroWinners { contest: String },
    #[error("contest {contest}: {num_winners} winner(s) but only {candidates} candidate(s), no losers")]
    NoLosers { contest: String, num_winners: usize, candidates: usize },
}

/// Signed vote gap over total ballots cast, kept exact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DilutedMargin {
    pub vote_gap: i64,
    pub ballots_cast: u64,
}

impl DilutedMargin {
    /// `None` when no ballots were cast.
    pub fn fraction(&self) -> Option<f64> {
        if self.ballots_cast == 0 {
            return None;
        }
        Some(self.vote_gap as f64 / self.ballots_cast as f64)
    }

    /// Strictly positive margin over a non-empty ballot universe.
    pub fn is_auditable(&self) -> bool {
        self.vote_gap > 0 && self.ballots_cast > 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContestMargin {
    pub contest: String,
    pub worst_winner: Candidate,
    pub best_loser: Candidate,
    /// Winners in ranked order (most votes first).
    pub winners: Vec<Candidate>,
    /// Losers in ranked order (most votes first).
    pub losers: Vec<Candidate>,
    pub diluted: DilutedMargin,
}

impl ContestMargin {
    /// Every candidate, winners first, in ranked order.
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.winners.iter().chain(self.losers.iter())
    }
}

/// Parse `Name:Votes;...` into candidates in input order.
///
/// Blank entries (e.g. a trailing `;`) are skipped. Anything after a second
/// `:` in an entry is ignored.
pub fn parse_tabulation(contest: &str, raw: &str) -> Result<Vec<Candidate>, MarginError> {
    let mut out = Vec::new();
    for entry in raw.split(';') {
        if entry.trim().is_empty() {
            continue;
        }
        let mut parts = entry.split(':');
        let name = parts.next().unwrap_or_default().trim();
        let votes_raw = parts.next().ok_or_else(|| MarginError::MalformedEntry {
            contest: contest.to_string(),
            entry: entry.to_string(),
        })?;
        let votes = votes_raw.trim().parse::<u64>().map_err(|_| MarginError::VoteCount {
            contest: contest.to_string(),
            candidate: name.to_string(),
            value: votes_raw.to_string(),
        })?;
        out.push(Candidate::new(name, votes));
    }
    Ok(out)
}

/// Rank candidates and compute the diluted margin for `contest`.
pub fn compute_margin(contest: &Contest) -> Result<ContestMargin, MarginError> {
    let mut ranked = parse_tabulation(&contest.name, &contest.tabulated_votes)?;
    if contest.num_winners == 0 {
        return Err(MarginError::ZeroWinners { contest: contest.name.clone() });
    }
    if contest.num_winners >= ranked.len() {
        return Err(MarginError::NoLosers {
            contest: contest.name.clone(),
            num_winners: contest.num_winners,
            candidates: ranked.len(),
        });
    }

    // `sort_by` is stable: ties keep order of appearance.
    ranked.sort_by(|a, b| b.votes.cmp(&a.votes));
    let losers = ranked.split_off(contest.num_winners);
    let winners = ranked;

    // Both halves are non-empty after the checks above.
    let worst_winner = winners[winners.len() - 1].clone();
    let best_loser = losers[0].clone();
    let vote_gap = (i128::from(worst_winner.votes) - i128::from(best_loser.votes))
        .clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64;

    Ok(ContestMargin {
        contest: contest.name.clone(),
        worst_winner,
        best_loser,
        winners,
        losers,
        diluted: DilutedMargin { vote_gap, ballots_cast: contest.total_ballots_cast },
    })
}

// ----- Tests -----

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn contest(votes: &str, winners: usize, total: u64) -> Contest {
        Contest {
            name: "Mayor".into(),
            targeted: true,
            num_winners: winners,
            total_ballots_cast: total,
            tabulated_votes: votes.into(),
        }
    }

    #[test]
    fn two_candidate_margin() {
        let m = compute_margin(&contest("A:600;B:400", 1, 1200)).unwrap();
        assert_eq!(m.worst_winner, Candidate::new("A", 600));
        assert_eq!(m.best_loser, Candidate::new("B", 400));
        assert_eq!(m.diluted.vote_gap, 200);
        assert!((m.diluted.fraction().unwrap() - 1.0 / 6.0).abs() < 1e-12);
        assert!(m.diluted.is_auditable());
    }

    #[test]
    fn multi_winner_partition() {
        let m = compute_margin(&contest("A:50;B:30;C:20", 2, 100)).unwrap();
        assert_eq!(m.worst_winner.name, "B");
        assert_eq!(m.best_loser.name, "C");
        assert_eq!(m.diluted.fraction(), Some(0.10));
    }

    #[test]
    fn tie_is_zero_margin_and_keeps_input_order() {
        let m = compute_margin(&contest("X:100;Y:100", 1, 200)).unwrap();
        assert_eq!(m.worst_winner.name, "X");
        assert_eq!(m.best_loser.name, "Y");
        assert_eq!(m.diluted.fraction(), Some(0.0));
        assert!(!m.diluted.is_auditable());
    }

    #[test]
    fn no_ballots_cast_has_no_fraction() {
        let m = compute_margin(&contest("A:0;B:0", 1, 0)).unwrap();
        assert_eq!(m.diluted.fraction(), None);
        assert!(!m.diluted.is_auditable());
    }

    #[test]
    fn names_are_trimmed_and_trailing_separator_ignored() {
        let cands = parse_tabulation("Mayor", " Alice : 10 ; Bob:5;").unwrap();
        assert_eq!(cands, vec![Candidate::new("Alice", 10), Candidate::new("Bob", 5)]);
    }

    #[test]
    fn malformed_entries_are_errors() {
        assert!(matches!(
            parse_tabulation("Mayor", "Alice10;Bob:5"),
            Err(MarginError::MalformedEntry { .. })
        ));
        assert!(matches!(
            parse_tabulation("Mayor", "Alice:ten"),
            Err(MarginError::VoteCount { .. })
        ));
        assert!(matches!(
            parse_tabulation("Mayor", "Alice:-3"),
            Err(MarginError::VoteCount { .. })
        ));
    }

    #[test]
    fn winner_count_bounds() {
        assert!(matches!(
            compute_margin(&contest("A:1;B:2", 0, 3)),
            Err(MarginError::ZeroWinners { .. })
        ));
        assert!(matches!(
            compute_margin(&contest("A:1;B:2", 2, 3)),
            Err(MarginError::NoLosers { num_winners: 2, candidates: 2, .. })
        ));
    }

    proptest! {
        #[test]
        fn partition_sizes_and_ordering(
            votes in proptest::collection::vec(0u64..1_000, 2..8),
            winners_seed in 0usize..8,
        ) {
            let n = votes.len();
            let winners = 1 + winners_seed % (n - 1);
            let tab = votes
                .iter()
                .enumerate()
                .map(|(i, v)| format!("C{i}:{v}"))
                .collect::<Vec<_>>()
                .join(";");
            let total: u64 = votes.iter().sum();
            let m = compute_margin(&contest(&tab, winners, total)).unwrap();

            prop_assert_eq!(m.winners.len(), winners);
            prop_assert_eq!(m.losers.len(), n - winners);
            prop_assert!(m.worst_winner.votes >= m.best_loser.votes);
            prop_assert!(m.diluted.vote_gap >= 0);

            // Ranked descending, ties in order of appearance.
            let ranked: Vec<&Candidate> = m.candidates().collect();
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].votes >= pair[1].votes);
                if pair[0].votes == pair[1].votes {
                    let i0: usize = pair[0].name[1..].parse().unwrap();
                    let i1: usize = pair[1].name[1..].parse().unwrap();
                    prop_assert!(i0 < i1);
                }
            }
        }
    }
}
