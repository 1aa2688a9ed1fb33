// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Round-robin seating schedules for the social golfer problem.
//!
//! Builds a schedule of `rounds` rounds in which `tables * table_size`
//! players are partitioned into tables of `table_size`, preferring that no
//! pair of players shares a table twice, then balances which seat and which
//! table number each player is assigned across the rounds.
//!
//! # Architecture
//!
//! Construction is a backtracking search over whole rounds:
//!
//! - [`conflict::ConflictGraph`] - bitset of the pairs still allowed to meet
//! - [`pool::CandidatePool`] - the tables that can still be formed, rebuilt
//!   from maximal cliques of the conflict graph as it thins out
//! - [`trail::Trail`] - undo log giving O(1) checkpoints for backtracking
//! - [`engine`] - the generic try/retry predicate machine driving the search
//! - [`predicates::RoundPredicate`] - extends the schedule one round at a
//!   time, retrying with reshuffled candidates before giving up on a slot
//!
//! Balancing is local search over the finished schedule:
//!
//! - [`balance::seats::SeatBalancer`] - permutes seats within tables
//! - [`balance::tables::TableNumberBalancer`] - renumbers tables within
//!   rounds
//!
//! Both score a player's assignment counts against the fair band
//! `[slots_used / slots, ceil(slots_used / slots)]` and penalize deviation
//! exponentially.
//!
//! # Example
//!
//! ```
//! use golfer_search::{build_schedule, balance_seats, balance_tables, SolverConfig};
//!
//! let config = SolverConfig::new(4, 2).with_seed(1);
//! let schedule = build_schedule(&config).unwrap();
//! assert_eq!(schedule.pair_repeat_count(), 0);
//!
//! let (schedule, _) = balance_seats(schedule, &config);
//! let (schedule, report) = balance_tables(schedule, &config, config.threshold);
//! assert!(report.iterations <= config.balance_iteration_budget);
//! # drop(schedule);
//! ```

pub mod balance;
pub mod config;
pub mod conflict;
pub mod context;
pub mod engine;
pub mod error;
pub mod model;
pub mod pool;
pub mod predicates;
pub mod stats;
pub mod trail;

pub use balance::BalanceReport;
pub use config::SolverConfig;
pub use error::SolverError;
pub use model::{Pair, Player, Round, Schedule, Table};

use balance::seats::SeatBalancer;
use balance::tables::TableNumberBalancer;
use context::SearchContext;
use engine::EngineBuilder;
use predicates::{RoundPredicate, SolvedPredicate};
use tracing::info;

/// Construct a schedule for `config`.
///
/// Fails with [`SolverError::ConstructionExhausted`] when the retry budget
/// runs out at every depth before `config.rounds` rounds are built; the error
/// carries the deepest prefix reached. A zero-repeat schedule is preferred
/// but not guaranteed: once the candidate pool has to be regenerated, later
/// rounds may reuse pairs.
pub fn build_schedule(config: &SolverConfig) -> Result<Schedule, SolverError> {
    config.validate()?;
    let mut ctx = SearchContext::new(config.clone());
    let engine = EngineBuilder::new()
        .add(Box::new(RoundPredicate::new()))
        .terminal(SolvedPredicate);
    match engine.search(&mut ctx) {
        Some(engine) => {
            let (tries, retries) = engine.statistics();
            info!(
                rounds = ctx.rounds.len(),
                tries, retries, "schedule constructed"
            );
            Ok(Schedule::new(ctx.rounds))
        }
        None => {
            if let Some(fatal) = ctx.take_fatal() {
                return Err(fatal);
            }
            Err(SolverError::ConstructionExhausted {
                rounds_built: ctx.stats.deepest_round(),
                rounds_requested: config.rounds,
            })
        }
    }
}

/// Balance which seat each player occupies, leaving table membership alone.
pub fn balance_seats(mut schedule: Schedule, config: &SolverConfig) -> (Schedule, BalanceReport) {
    let report = SeatBalancer::new(config).run(&mut schedule);
    (schedule, report)
}

/// Balance which table number each player is assigned, leaving seatings
/// within tables alone. Stops once the score is at most `threshold`.
pub fn balance_tables(
    mut schedule: Schedule,
    config: &SolverConfig,
    threshold: u64,
) -> (Schedule, BalanceReport) {
    let report = TableNumberBalancer::new(config).run(&mut schedule, threshold);
    (schedule, report)
}
