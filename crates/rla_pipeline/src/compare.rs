//! crates/rla_pipeline/src/compare.rs
//! Recomputed vs. platform-reported p-values.

use rla_core::Round;

/// The reported p-value for `contest`: the last ROUNDS row (file order) that
/// names the contest and carries a value.
pub fn reported_p_value(rounds: &[Round], contest: &str) -> Option<f64> {
    rounds
        .iter()
        .rev()
        .filter(|r| r.contest == contest)
        .find_map(|r| r.p_value)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PValueCheck {
    /// Recomputed p, capped at 1.
    pub recomputed: f64,
    pub reported: Option<f64>,
    /// `None` when nothing was reported.
    pub agrees: Option<bool>,
    pub meets_risk_limit: bool,
}

impl PValueCheck {
    pub fn new(recomputed: f64, reported: Option<f64>, risk_limit: f64, tolerance: f64) -> Self {
        let recomputed = recomputed.min(1.0);
        let agrees = reported.map(|r| (r - recomputed).abs() <= tolerance);
        Self {
            recomputed,
            reported,
            agrees,
            meets_risk_limit: recomputed <= risk_limit,
        }
    }

    /// A reported value exists and differs beyond tolerance.
    pub fn is_mismatch(&self) -> bool {
        self.agrees == Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(n: u32, contest: &str, p: Option<f64>) -> Round {
        Round { round_number: n, contest: contest.into(), p_value: p }
    }

    #[test]
    fn last_reported_value_wins() {
        let rounds = vec![
            round(1, "Mayor", Some(0.4)),
            round(1, "Measure A", Some(0.9)),
            round(2, "Mayor", Some(0.08)),
            round(3, "Mayor", None),
        ];
        assert_eq!(reported_p_value(&rounds, "Mayor"), Some(0.08));
        assert_eq!(reported_p_value(&rounds, "Measure A"), Some(0.9));
        assert_eq!(reported_p_value(&rounds, "Council"), None);
    }

    #[test]
    fn tolerance_and_cap() {
        let c = PValueCheck::new(0.08004, Some(0.08), 0.1, 1e-4);
        assert_eq!(c.agrees, Some(true));
        assert!(c.meets_risk_limit);

        let c = PValueCheck::new(24.5, Some(1.0), 0.1, 1e-4);
        assert_eq!(c.recomputed, 1.0);
        assert_eq!(c.agrees, Some(true));
        assert!(!c.meets_risk_limit);

        let c = PValueCheck::new(0.3, Some(0.05), 0.1, 1e-4);
        assert!(c.is_mismatch());

        let c = PValueCheck::new(0.3, None, 0.1, 1e-4);
        assert_eq!(c.agrees, None);
        assert!(!c.is_mismatch());
    }
}
