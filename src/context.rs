// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Search context: all mutable state of the construction search.
//!
//! The context owns the conflict graph, the candidate pool, the partial
//! schedule, the trail, the random source, and the statistics counters.
//! Predicates mutate it only through the trailed methods below, so that the
//! engine can rewind any prefix of effects on backtracking. Statistics and
//! the random source are deliberately not rewound: they describe work done.

use crate::config::SolverConfig;
use crate::conflict::ConflictGraph;
use crate::error::SolverError;
use crate::model::{Pair, Round};
use crate::pool::CandidatePool;
use crate::stats::SearchStatistics;
use crate::trail::{Trail, TrailEntry};
use rand_chacha::ChaCha8Rng;

#[derive(Debug)]
pub struct SearchContext {
    pub config: SolverConfig,
    pub rng: ChaCha8Rng,
    pub conflicts: ConflictGraph,
    pub pool: CandidatePool,
    /// Rounds accepted so far, in order. Grows and shrinks with the trail.
    pub rounds: Vec<Round>,
    pub trail: Trail,
    pub stats: SearchStatistics,
    /// Set on an internal-consistency violation; the engine aborts the run.
    fatal: Option<SolverError>,
}

impl SearchContext {
    /// A fresh context for one construction run: complete conflict graph,
    /// complete candidate pool, empty schedule.
    pub fn new(config: SolverConfig) -> Self {
        let rng = config.rng();
        let conflicts = ConflictGraph::complete(config.player_count());
        let pool = CandidatePool::complete(config.player_count(), config.table_size);
        Self {
            config,
            rng,
            conflicts,
            pool,
            rounds: Vec::new(),
            trail: Trail::new(),
            stats: SearchStatistics::new(),
            fatal: None,
        }
    }

    /// Trail checkpoint for the current state.
    #[inline]
    pub fn checkpoint(&self) -> usize {
        self.trail.checkpoint()
    }

    /// Remove a conflict edge, trailing the removal if it did anything.
    pub fn remove_pair(&mut self, pair: Pair) {
        if self.conflicts.remove(pair) {
            self.trail.record(TrailEntry::PairRemoved(pair));
        }
    }

    /// Swap in a new candidate pool, trailing the old one for restore.
    pub fn replace_pool(&mut self, pool: CandidatePool) {
        let old = std::mem::replace(&mut self.pool, pool);
        self.trail.record(TrailEntry::PoolReplaced(old));
    }

    /// Append an accepted round to the partial schedule (trailed).
    pub fn append_round(&mut self, round: Round) {
        self.rounds.push(round);
        self.stats.note_depth(self.rounds.len());
        self.trail.record(TrailEntry::RoundAppended);
    }

    /// Rewind all effects recorded past `mark`, newest first.
    pub fn rewind_to(&mut self, mark: usize) {
        while let Some(entry) = self.trail.pop_past(mark) {
            match entry {
                TrailEntry::PairRemoved(pair) => self.conflicts.insert(pair),
                TrailEntry::PoolReplaced(pool) => self.pool = pool,
                TrailEntry::RoundAppended => {
                    self.rounds.pop();
                }
            }
        }
    }

    /// Record a fatal internal-consistency failure. The engine checks this
    /// after every predicate call and aborts instead of backtracking.
    pub fn set_fatal(&mut self, error: SolverError) {
        if self.fatal.is_none() {
            self.fatal = Some(error);
        }
    }

    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }

    pub fn take_fatal(&mut self) -> Option<SolverError> {
        self.fatal.take()
    }
}
