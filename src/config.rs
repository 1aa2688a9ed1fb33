// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Solver configuration.
//!
//! A [`SolverConfig`] fixes the problem shape (tables, table size, rounds) and
//! the search knobs (retry budget, balancing iteration budget, optional
//! double-swap neighborhood). The random source is seeded from here so that
//! whole runs are reproducible; `seed: None` draws from OS entropy.

use crate::error::SolverError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Per-round retry budget at every round slot except the last (which gets 1).
pub const DEFAULT_ROUND_RETRY_BUDGET: usize = 10;

/// Default iteration budget for each balancing loop.
///
/// The balancing loops have no formal convergence guarantee; the budget turns
/// "may loop forever" into "returns the best schedule observed so far".
pub const DEFAULT_BALANCE_ITERATION_BUDGET: u64 = 100_000;

/// Configuration for a full solver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Number of tables per round.
    pub tables: usize,
    /// Players per table. The canonical game uses 4.
    pub table_size: usize,
    /// Number of rounds to construct.
    pub rounds: usize,
    /// Residual table-number imbalance accepted by `balance_tables`.
    /// 0 demands perfect balance.
    pub threshold: u64,
    /// Seed for the pseudo-random source. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Reshuffle attempts per round slot before backtracking.
    pub round_retry_budget: usize,
    /// Iteration cap for each balancing loop.
    pub balance_iteration_budget: u64,
    /// Enable the double simultaneous swap neighborhood in table balancing.
    pub double_swap: bool,
}

impl SolverConfig {
    /// A configuration with default table size (4) and knobs.
    pub fn new(tables: usize, rounds: usize) -> Self {
        Self {
            tables,
            table_size: 4,
            rounds,
            threshold: 0,
            seed: None,
            round_retry_budget: DEFAULT_ROUND_RETRY_BUDGET,
            balance_iteration_budget: DEFAULT_BALANCE_ITERATION_BUDGET,
            double_swap: false,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_table_size(mut self, table_size: usize) -> Self {
        self.table_size = table_size;
        self
    }

    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_double_swap(mut self, enabled: bool) -> Self {
        self.double_swap = enabled;
        self
    }

    pub fn with_balance_iteration_budget(mut self, budget: u64) -> Self {
        self.balance_iteration_budget = budget;
        self
    }

    #[inline]
    pub fn player_count(&self) -> usize {
        self.tables * self.table_size
    }

    /// Upper bound on rounds without any pair repeat: each round spends
    /// `table_size - 1` of a player's `player_count - 1` possible partners.
    ///
    /// The builder accepts requests beyond the bound (repeats become possible
    /// once the candidate pool is regenerated), so this is advisory.
    pub fn max_rounds_bound(&self) -> usize {
        (self.player_count() - 1) / (self.table_size - 1)
    }

    /// Reject shapes the search cannot represent, before any work is done.
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.tables == 0 {
            return Err(SolverError::invalid_config("tables must be at least 1"));
        }
        if self.table_size < 2 {
            return Err(SolverError::invalid_config("table_size must be at least 2"));
        }
        if self.rounds == 0 {
            return Err(SolverError::invalid_config("rounds must be at least 1"));
        }
        if self.player_count() > 128 {
            // Player sets are tracked as u128 bitmasks.
            return Err(SolverError::invalid_config(
                "player population is capped at 128",
            ));
        }
        if self.round_retry_budget == 0 {
            return Err(SolverError::invalid_config(
                "round_retry_budget must be at least 1",
            ));
        }
        Ok(())
    }

    /// The pseudo-random source for a run. Each phase creates its own stream
    /// so phases stay independently reproducible.
    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}

impl Default for SolverConfig {
    /// The original game: 10 tables of 4, as many zero-repeat rounds as the
    /// pairing bound allows.
    fn default() -> Self {
        let config = Self::new(10, 1);
        let rounds = config.max_rounds_bound();
        Self { rounds, ..config }
    }
}
