// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Statistics
//!
//! Counters incremented as the construction search runs. They are owned by the
//! `SearchContext` and are not rewound on backtracking: they describe work
//! performed, not search state.

use strum::EnumCount;
use strum_macros::EnumCount as EnumCountMacro;

#[derive(Debug, EnumCountMacro, Copy, Clone)]
#[repr(u8)]
pub enum Counter {
    /// Round partitions accepted (including ones later undone by backtracking).
    RoundsAccepted,
    /// Partition attempts that failed and consumed a retry.
    RoundRetries,
    /// Times the candidate pool was found empty at a round slot.
    PoolExhaustions,
    /// Times the pool was rebuilt from the residual conflict graph.
    PoolRegenerations,
}

#[derive(Debug, Default)]
pub struct SearchStatistics {
    stats: [u64; Counter::COUNT],
    deepest_round: usize,
}

impl SearchStatistics {
    pub fn new() -> Self {
        SearchStatistics::default()
    }

    /// Increment the specified counter by 1.
    pub fn increment(&mut self, counter: Counter) {
        self.stats[counter as usize] += 1;
    }

    /// Get the current value of the specified counter.
    pub fn get(&self, counter: Counter) -> u64 {
        self.stats[counter as usize]
    }

    /// Record that the search held `depth` completed rounds at some point.
    pub fn note_depth(&mut self, depth: usize) {
        if depth > self.deepest_round {
            self.deepest_round = depth;
        }
    }

    /// The largest number of simultaneously completed rounds seen.
    pub fn deepest_round(&self) -> usize {
        self.deepest_round
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = SearchStatistics::new();
        assert_eq!(stats.get(Counter::RoundsAccepted), 0);
        assert_eq!(stats.get(Counter::PoolRegenerations), 0);
        assert_eq!(stats.deepest_round(), 0);
    }

    #[test]
    fn test_increment_and_depth() {
        let mut stats = SearchStatistics::new();
        stats.increment(Counter::RoundRetries);
        stats.increment(Counter::RoundRetries);
        stats.increment(Counter::RoundsAccepted);
        assert_eq!(stats.get(Counter::RoundRetries), 2);
        assert_eq!(stats.get(Counter::RoundsAccepted), 1);

        stats.note_depth(3);
        stats.note_depth(1);
        assert_eq!(stats.deepest_round(), 3);
    }
}
