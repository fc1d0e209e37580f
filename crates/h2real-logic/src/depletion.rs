//! Greedy oxidizer depletion across an ordered reservoir list.
//!
//! Reservoirs are drained front to back. A reservoir that cannot cover the
//! remaining demand is emptied and the walk moves on; the first reservoir
//! that can cover it is reduced and the walk stops. Nothing drained earlier
//! is ever refunded, so a failed pass still costs whatever oxidizer it found.

use serde::{Deserialize, Serialize};

/// Capacity and fill of one reservoir.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReservoirLevel {
    /// Capacity in litres.
    pub capacity: f64,
    /// Fill ratio in [0, 1].
    pub fill_ratio: f64,
}

impl ReservoirLevel {
    pub fn new(capacity: f64, fill_ratio: f64) -> Self {
        Self {
            capacity,
            fill_ratio,
        }
    }

    /// Stored volume in litres.
    pub fn stored(&self) -> f64 {
        self.capacity * self.fill_ratio
    }
}

/// Host storage the depletion engine reads and writes through.
pub trait ReservoirStore {
    type Id: Copy;

    /// Current level, or `None` if the reservoir no longer exists.
    fn level(&self, id: Self::Id) -> Option<ReservoirLevel>;

    /// Replace the fill ratio in one write.
    fn set_fill_ratio(&mut self, id: Self::Id, fill_ratio: f64);
}

impl ReservoirStore for [ReservoirLevel] {
    type Id = usize;

    fn level(&self, id: usize) -> Option<ReservoirLevel> {
        self.get(id).copied()
    }

    fn set_fill_ratio(&mut self, id: usize, fill_ratio: f64) {
        if let Some(level) = self.get_mut(id) {
            level.fill_ratio = fill_ratio;
        }
    }
}

impl ReservoirStore for Vec<ReservoirLevel> {
    type Id = usize;

    fn level(&self, id: usize) -> Option<ReservoirLevel> {
        self.as_slice().level(id)
    }

    fn set_fill_ratio(&mut self, id: usize, fill_ratio: f64) {
        self.as_mut_slice().set_fill_ratio(id, fill_ratio);
    }
}

/// Outcome of one depletion pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Depletion {
    /// The full demand was met by some non-empty reservoir.
    pub satisfied: bool,
    /// Litres actually removed across all reservoirs.
    pub drained: f64,
    /// Demand left uncovered (0 when satisfied).
    pub shortfall: f64,
}

/// Remove `required` litres from `reservoirs`, in order.
///
/// Empty reservoirs are skipped. Satisfaction requires reaching a non-empty
/// reservoir that covers the remainder, so a zero demand against an all-empty
/// list is still unsatisfied.
pub fn deplete<S>(store: &mut S, reservoirs: &[S::Id], required: f64) -> Depletion
where
    S: ReservoirStore + ?Sized,
{
    let mut remaining = required.max(0.0);
    let mut drained = 0.0;

    for &id in reservoirs {
        let Some(level) = store.level(id) else {
            continue;
        };
        if level.fill_ratio <= 0.0 || level.capacity <= 0.0 {
            continue;
        }

        let available = level.stored();
        if available < remaining {
            store.set_fill_ratio(id, 0.0);
            remaining -= available;
            drained += available;
        } else {
            store.set_fill_ratio(id, (available - remaining) / level.capacity);
            drained += remaining;
            return Depletion {
                satisfied: true,
                drained,
                shortfall: 0.0,
            };
        }
    }

    if remaining > 0.0 {
        log::debug!("oxidizer shortfall of {:.3} L after draining {:.3} L", remaining, drained);
    }

    Depletion {
        satisfied: false,
        drained,
        shortfall: remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn test_exact_satisfy_from_one_reservoir() {
        let mut tanks = vec![ReservoirLevel::new(100.0, 0.5)];
        let result = deplete(&mut tanks, &all(1), 30.0);
        assert!(result.satisfied);
        assert!((tanks[0].fill_ratio - 0.20).abs() < 1e-9);
        assert!((result.drained - 30.0).abs() < 1e-9);
        assert_eq!(result.shortfall, 0.0);
    }

    #[test]
    fn test_cascades_into_next_reservoir() {
        let mut tanks = vec![ReservoirLevel::new(10.0, 1.0), ReservoirLevel::new(100.0, 0.5)];
        let result = deplete(&mut tanks, &all(2), 40.0);
        assert!(result.satisfied);
        assert_eq!(tanks[0].fill_ratio, 0.0);
        assert!((tanks[1].fill_ratio - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_starvation_keeps_partial_drain() {
        let mut tanks = vec![ReservoirLevel::new(10.0, 0.3)];
        let result = deplete(&mut tanks, &all(1), 10.0);
        assert!(!result.satisfied);
        assert_eq!(tanks[0].fill_ratio, 0.0);
        assert!((result.drained - 3.0).abs() < 1e-9);
        assert!((result.shortfall - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_stops_at_first_sufficient_reservoir() {
        let mut tanks = vec![ReservoirLevel::new(100.0, 1.0), ReservoirLevel::new(100.0, 1.0)];
        assert!(deplete(&mut tanks, &all(2), 10.0).satisfied);
        assert!((tanks[0].fill_ratio - 0.9).abs() < 1e-9);
        assert_eq!(tanks[1].fill_ratio, 1.0);
    }

    #[test]
    fn test_empty_reservoirs_are_skipped() {
        let mut tanks = vec![ReservoirLevel::new(50.0, 0.0), ReservoirLevel::new(50.0, 1.0)];
        assert!(deplete(&mut tanks, &all(2), 25.0).satisfied);
        assert_eq!(tanks[0].fill_ratio, 0.0);
        assert!((tanks[1].fill_ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_demand_needs_a_non_empty_reservoir() {
        let mut empty = vec![ReservoirLevel::new(50.0, 0.0)];
        assert!(!deplete(&mut empty, &all(1), 0.0).satisfied);

        let mut full = vec![ReservoirLevel::new(50.0, 1.0)];
        assert!(deplete(&mut full, &all(1), 0.0).satisfied);
        assert_eq!(full[0].fill_ratio, 1.0);
    }

    #[test]
    fn test_no_reservoirs_is_unsatisfied() {
        let mut tanks: Vec<ReservoirLevel> = Vec::new();
        let result = deplete(&mut tanks, &[], 1.0);
        assert!(!result.satisfied);
        assert_eq!(result.drained, 0.0);
    }

    #[test]
    fn test_missing_ids_are_skipped() {
        let mut tanks = vec![ReservoirLevel::new(10.0, 1.0)];
        assert!(deplete(&mut tanks, &[5, 0], 5.0).satisfied);
        assert!((tanks[0].fill_ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_storage_never_increases() {
        let mut tanks = vec![
            ReservoirLevel::new(3.0, 0.7),
            ReservoirLevel::new(8.0, 0.1),
            ReservoirLevel::new(20.0, 0.9),
        ];
        let before: Vec<f64> = tanks.iter().map(ReservoirLevel::stored).collect();
        deplete(&mut tanks, &all(3), 50.0);
        for (level, prior) in tanks.iter().zip(before) {
            assert!(level.stored() <= prior + 1e-12);
        }
    }
}
