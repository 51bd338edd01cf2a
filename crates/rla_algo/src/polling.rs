//! crates/rla_algo/src/polling.rs
//! Ballot-polling risk (BRAVO sequential probability ratio test).
//!
//! For every (winner, loser) pair the engine keeps:
//! - `share`   = w / (w + l) from reported votes (0.5 when both are zero),
//! - `t`       = running test statistic, frozen once the pair finishes,
//! - `total_t` = running statistic over every draw,
//! - `finished_at` = 1-based draw index where `total_t` first reached 1/α.
//!
//! A draw that shows `w` and not `l` multiplies by share/0.5; one that shows
//! `l` and not `w` multiplies by (1 − share)/0.5; anything else leaves the pair
//! alone. The audit stops at the first draw after which every pair has
//! finished. `tot_p` is max over pairs of 1/`total_t`; `seq_p` is the same
//! maximum over the frozen `t`.

use rla_core::{PhantomPolicy, PhantomRng};
use tracing::{debug, trace};

use crate::margin::ContestMargin;
use crate::sample::order_by_ticket;

/// What a single draw showed for the contest under audit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observation<'a> {
    /// Audited interpretation; may list several comma-separated choices.
    Audited(&'a str),
    /// Drawn ballot that was never audited.
    Phantom,
}

/// One sampled ticket and what it showed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Draw<'a> {
    pub ticket: f64,
    pub observation: Observation<'a>,
}

/// How phantom draws are charged.
#[derive(Clone, Debug)]
pub enum PhantomSource {
    /// Always `losers[0]`, the best-ranked loser. In a single-winner race
    /// that is the runner-up, the second-ranked candidate overall.
    WorstCase,
    /// Uniform over all candidates, from a seeded stream.
    Simulate(PhantomRng),
}

impl PhantomSource {
    pub fn from_policy(policy: &PhantomPolicy) -> Self {
        match policy {
            PhantomPolicy::WorstCase => PhantomSource::WorstCase,
            PhantomPolicy::Simulate { seed } => PhantomSource::Simulate(PhantomRng::from_seed_u64(*seed)),
        }
    }

    fn pick<'m>(&mut self, margin: &'m ContestMargin) -> &'m str {
        match self {
            PhantomSource::WorstCase => &margin.best_loser.name,
            PhantomSource::Simulate(rng) => {
                let all: Vec<&str> = margin.candidates().map(|c| c.name.as_str()).collect();
                match rng.choose_index(&all) {
                    Some(i) => all[i],
                    None => &margin.best_loser.name,
                }
            }
        }
    }
}

/// Final state of one (winner, loser) pair.
#[derive(Clone, Debug, PartialEq)]
pub struct PairRisk {
    pub winner: String,
    pub loser: String,
    pub share: f64,
    pub t: f64,
    pub total_t: f64,
    pub finished_at: Option<usize>,
}

impl PairRisk {
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PollingOutcome {
    /// Winner-major, loser-minor, both in ranked order.
    pub pairs: Vec<PairRisk>,
    /// max over pairs of 1/`total_t`.
    pub tot_p: f64,
    /// max over pairs of 1/`t` (the adaptively stopped statistic).
    pub seq_p: f64,
    /// 1-based draw index at which every pair had finished.
    pub stop_index: Option<usize>,
    pub draws: usize,
    pub phantoms: usize,
    /// Audited draws that named none of the contest's candidates.
    pub unrecognized: usize,
    pub collisions: usize,
}

impl PollingOutcome {
    pub fn p_value(&self) -> f64 {
        self.tot_p
    }
}

#[derive(Clone, Copy, Debug)]
struct PairState {
    share: f64,
    t: f64,
    total_t: f64,
    finished_at: Option<usize>,
}

/// Fixed-size pair table indexed by `w * n_losers + l`.
struct PairTable {
    n_losers: usize,
    cells: Vec<PairState>,
}

impl PairTable {
    fn new(margin: &ContestMargin) -> Self {
        let n_losers = margin.losers.len();
        let mut cells = Vec::with_capacity(margin.winners.len() * n_losers);
        for w in &margin.winners {
            for l in &margin.losers {
                let sum = w.votes as f64 + l.votes as f64;
                let share = if sum > 0.0 { w.votes as f64 / sum } else { 0.5 };
                cells.push(PairState { share, t: 1.0, total_t: 1.0, finished_at: None });
            }
        }
        Self { n_losers, cells }
    }

    fn cell_mut(&mut self, w: usize, l: usize) -> &mut PairState {
        &mut self.cells[w * self.n_losers + l]
    }

    fn all_finished(&self) -> bool {
        self.cells.iter().all(|c| c.finished_at.is_some())
    }
}

/// Run BRAVO over `draws` (given in file order) for one contest.
///
/// `epsilon` resolves duplicate ticket numbers; `risk_limit` sets the
/// finishing threshold 1/α.
pub fn polling_risk<'a>(
    margin: &ContestMargin,
    draws: impl IntoIterator<Item = Draw<'a>>,
    risk_limit: f64,
    epsilon: f64,
    phantom: &mut PhantomSource,
) -> PollingOutcome {
    let threshold = 1.0 / risk_limit;
    let ordered = order_by_ticket(draws.into_iter().map(|d| (d.ticket, d.observation)), epsilon);
    let mut table = PairTable::new(margin);

    let mut phantoms = 0usize;
    let mut unrecognized = 0usize;
    let mut stop_index = None;

    for (idx, (ticket, observation)) in ordered.draws.iter().enumerate() {
        let n = idx + 1;
        let choices: Vec<&str> = match observation {
            Observation::Audited(result) => result
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect(),
            Observation::Phantom => {
                phantoms += 1;
                vec![phantom.pick(margin)]
            }
        };

        let win_hits: Vec<bool> = margin.winners.iter().map(|c| choices.contains(&c.name.as_str())).collect();
        let lose_hits: Vec<bool> = margin.losers.iter().map(|c| choices.contains(&c.name.as_str())).collect();
        if !win_hits.iter().chain(lose_hits.iter()).any(|&h| h) {
            if matches!(observation, Observation::Audited(_)) {
                unrecognized += 1;
            }
            trace!(ticket, ?choices, "draw names no candidate");
            continue;
        }

        for (wi, &w_hit) in win_hits.iter().enumerate() {
            for (li, &l_hit) in lose_hits.iter().enumerate() {
                let cell = table.cell_mut(wi, li);
                let factor = match (w_hit, l_hit) {
                    (true, false) => cell.share / 0.5,
                    (false, true) => (1.0 - cell.share) / 0.5,
                    _ => continue,
                };
                cell.total_t *= factor;
                if cell.finished_at.is_none() {
                    cell.t *= factor;
                    if cell.total_t >= threshold {
                        cell.finished_at = Some(n);
                    }
                }
            }
        }

        if stop_index.is_none() && table.all_finished() {
            stop_index = Some(n);
            debug!(contest = %margin.contest, draw = n, "all pairs finished");
        }
    }

    let max_inverse = |f: fn(&PairState) -> f64| {
        table.cells.iter().map(|c| 1.0 / f(c)).fold(f64::NEG_INFINITY, f64::max)
    };
    let tot_p = max_inverse(|c: &PairState| c.total_t);
    let seq_p = max_inverse(|c: &PairState| c.t);

    let mut pairs = Vec::with_capacity(table.cells.len());
    for (wi, w) in margin.winners.iter().enumerate() {
        for (li, l) in margin.losers.iter().enumerate() {
            let c = table.cells[wi * table.n_losers + li];
            pairs.push(PairRisk {
                winner: w.name.clone(),
                loser: l.name.clone(),
                share: c.share,
                t: c.t,
                total_t: c.total_t,
                finished_at: c.finished_at,
            });
        }
    }

    PollingOutcome {
        pairs,
        tot_p,
        seq_p,
        stop_index,
        draws: ordered.len(),
        phantoms,
        unrecognized,
        collisions: ordered.collisions,
    }
}

// ----- Tests -----
