// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Common test utilities shared across integration tests.

use golfer_search::{Player, Round, Schedule, SolverConfig, Table};

/// Assert the structural invariants of a constructed schedule: round count,
/// table counts, table sizes, and each round partitioning the players.
pub fn assert_valid_schedule(schedule: &Schedule, config: &SolverConfig) {
    assert_eq!(schedule.len(), config.rounds);
    for round in schedule.rounds() {
        assert_eq!(round.tables().len(), config.tables);
        for table in round.tables() {
            assert_eq!(table.size(), config.table_size);
        }
        assert!(round.is_partition_of(config.player_count()));
    }
}

/// `rounds` identical rounds of `tables` tables of four, seated in player
/// order. Maximally unbalanced in both seats and table numbers, which makes
/// it a convenient balancing workload.
pub fn repeated_rounds(tables: usize, rounds: usize) -> Schedule {
    let round = Round::new(
        (0..tables)
            .map(|t| Table::new((0..4).map(|s| Player((t * 4 + s) as u16)).collect()))
            .collect(),
    );
    Schedule::new(vec![round; rounds])
}

/// The set of table membership masks per round, ignoring seat order and
/// table numbering. Balancing must never change this.
pub fn membership(schedule: &Schedule) -> Vec<Vec<u128>> {
    schedule
        .rounds()
        .iter()
        .map(|round| {
            let mut masks: Vec<u128> = round.tables().iter().map(|t| t.mask()).collect();
            masks.sort_unstable();
            masks
        })
        .collect()
}
