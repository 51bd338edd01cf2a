//! crates/rla_algo/src/sample.rs
//! Ticket ordering for sampled draws.
//!
//! Draws are keyed by their ticket number. When a key is already taken the
//! new draw is nudged upward by `epsilon` until it lands on a free key, so the
//! draw seen first keeps the lower position. Iteration is ascending by key.

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Ticket number with a total order (`f64::total_cmp`).
#[derive(Clone, Copy, Debug)]
pub struct TicketKey(pub f64);

impl PartialEq for TicketKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for TicketKey {}

impl PartialOrd for TicketKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for TicketKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Draws in ascending resolved-ticket order.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderedDraws<T> {
    pub draws: Vec<(f64, T)>,
    /// Number of epsilon nudges applied while resolving collisions.
    pub collisions: usize,
}

impl<T> OrderedDraws<T> {
    pub fn len(&self) -> usize {
        self.draws.len()
    }
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}

/// Order `(ticket, item)` pairs given in file order. Tickets must be finite.
pub fn order_by_ticket<T, I>(items: I, epsilon: f64) -> OrderedDraws<T>
where
    I: IntoIterator<Item = (f64, T)>,
{
    let mut keyed: BTreeMap<TicketKey, T> = BTreeMap::new();
    let mut collisions = 0usize;

    for (ticket, item) in items {
        let mut key = ticket;
        while keyed.contains_key(&TicketKey(key)) {
            key = bump(key, epsilon);
            collisions += 1;
        }
        keyed.insert(TicketKey(key), item);
    }

    if collisions > 0 {
        tracing::debug!(collisions, "ticket collisions resolved");
    }

    OrderedDraws {
        draws: keyed.into_iter().map(|(k, v)| (k.0, v)).collect(),
        collisions,
    }
}

/// `key + epsilon`, or the next representable value above `key` when the
/// addition is absorbed by rounding.
fn bump(key: f64, epsilon: f64) -> f64 {
    let next = key + epsilon;
    if next > key {
        return next;
    }
    next_up(key)
}

fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        return x;
    }
    if x == 0.0 {
        return f64::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

// ----- Tests -----

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sorts_ascending() {
        let o = order_by_ticket(vec![(0.3, "c"), (0.1, "a"), (0.2, "b")], 1e-10);
        let names: Vec<_> = o.draws.iter().map(|(_, n)| *n).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(o.collisions, 0);
    }

    #[test]
    fn collision_nudges_later_draw() {
        let o = order_by_ticket(vec![(5.0, "first"), (5.0, "second")], 1e-10);
        assert_eq!(o.draws[0], (5.0, "first"));
        assert_eq!(o.draws[1].1, "second");
        assert_eq!(o.draws[1].0, 5.0 + 1e-10);
        assert_eq!(o.collisions, 1);
    }

    #[test]
    fn repeated_collisions_keep_arrival_order() {
        let o = order_by_ticket(vec![(1.0, 0), (1.0, 1), (1.0, 2)], 1e-10);
        let order: Vec<_> = o.draws.iter().map(|(_, i)| *i).collect();
        assert_eq!(order, [0, 1, 2]);
        assert_eq!(o.collisions, 3);
    }

    #[test]
    fn absorbed_epsilon_still_terminates() {
        let o = order_by_ticket(vec![(1e12, 'a'), (1e12, 'b')], 1e-10);
        assert_eq!(o.len(), 2);
        assert!(o.draws[1].0 > o.draws[0].0);
    }

    #[test]
    fn next_up_handles_signs() {
        assert!(next_up(-1.0) > -1.0);
        assert!(next_up(0.0) > 0.0);
        assert!(next_up(-0.0) > 0.0);
    }

    proptest! {
        #[test]
        fn no_draw_is_lost_and_keys_ascend(
            tickets in proptest::collection::vec(0u32..50, 0..60),
        ) {
            let items = tickets.iter().enumerate().map(|(i, t)| (f64::from(*t) / 10.0, i));
            let o = order_by_ticket(items, 1e-10);
            prop_assert_eq!(o.len(), tickets.len());
            for w in o.draws.windows(2) {
                prop_assert!(w[0].0 < w[1].0);
            }
            let mut seen: Vec<usize> = o.draws.iter().map(|(_, i)| *i).collect();
            seen.sort_unstable();
            prop_assert_eq!(seen, (0..tickets.len()).collect::<Vec<_>>());
        }
    }
}
