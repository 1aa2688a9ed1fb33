// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! RoundPredicate - the construction search.
//!
//! One engine round builds one schedule round: a selection of `tables`
//! pairwise-disjoint candidates from the pool, committed by removing the
//! seated pairs from the conflict graph and filtering the pool. Each engine
//! choice is one partition attempt on an independently reshuffled pool, so
//! `Choices(budget)` is the retry policy: up to `round_retry_budget` reshuffles
//! per slot, but only 1 at the final slot, before the engine backtracks to the
//! previous slot and spends its remaining choices.
//!
//! When the pool runs dry and the number of completed rounds is a multiple of
//! the table size, the pool is regenerated from the residual conflict graph by
//! maximal-clique enumeration. From that point on pair repeats are possible;
//! the search only minimizes them.

use crate::context::SearchContext;
use crate::engine::{Predicate, PredicateResult};
use crate::error::SolverError;
use crate::model::{Player, Round, Table};
use crate::pool::{Candidate, CandidatePool};
use crate::stats::Counter;
use rand::seq::SliceRandom;
use tracing::debug;

#[derive(Debug, Default)]
pub struct RoundPredicate;

impl RoundPredicate {
    pub fn new() -> Self {
        Self
    }
}

impl Predicate for RoundPredicate {
    fn try_pred(&mut self, ctx: &mut SearchContext, round: usize) -> PredicateResult {
        if round == ctx.config.rounds {
            // All rounds built: hand off to the terminal predicate.
            return PredicateResult::Success;
        }
        let budget = if round + 1 == ctx.config.rounds {
            1
        } else {
            ctx.config.round_retry_budget
        };
        PredicateResult::Choices(budget)
    }

    fn retry_pred(
        &mut self,
        ctx: &mut SearchContext,
        round: usize,
        _choice: usize,
    ) -> PredicateResult {
        if ctx.pool.is_empty() {
            ctx.stats.increment(Counter::PoolExhaustions);
            if ctx.rounds.len() % ctx.config.table_size == 0 {
                let regenerated = CandidatePool::regenerate(
                    &ctx.conflicts,
                    ctx.config.table_size,
                    &mut ctx.rng,
                );
                debug!(
                    round,
                    candidates = regenerated.len(),
                    "regenerated candidate pool from residual conflict graph"
                );
                ctx.stats.increment(Counter::PoolRegenerations);
                ctx.replace_pool(regenerated);
            }
            if ctx.pool.is_empty() {
                ctx.stats.increment(Counter::RoundRetries);
                return PredicateResult::Failure;
            }
        }

        ctx.pool.shuffle(&mut ctx.rng);

        let Some(chosen) = select_disjoint(ctx.pool.as_slice(), ctx.config.tables) else {
            ctx.stats.increment(Counter::RoundRetries);
            return PredicateResult::Failure;
        };

        // Defensive: a chosen candidate seating an incompatible pair means the
        // pool went stale - a bookkeeping bug, fatal rather than retryable.
        for &index in &chosen {
            for pair in ctx.pool.as_slice()[index].pairs() {
                let (p, q) = pair.players();
                if !ctx.conflicts.are_compatible(p, q) {
                    ctx.set_fatal(SolverError::InternalConsistency { round, pair });
                    return PredicateResult::Failure;
                }
            }
        }

        // Commit: take the tables out, spend their pairs, filter the pool.
        let tables: Vec<Vec<Player>> = chosen
            .iter()
            .map(|&index| ctx.pool.as_slice()[index].members().to_vec())
            .collect();
        for table in &tables {
            for i in 0..table.len() {
                for j in i + 1..table.len() {
                    ctx.remove_pair(crate::model::Pair::new(table[i], table[j]));
                }
            }
        }
        let mut filtered = ctx.pool.clone();
        filtered.retain_compatible(&ctx.conflicts);
        ctx.replace_pool(filtered);

        // Seat order starts random; the seat balancer reworks it later.
        let tables: Vec<Table> = tables
            .into_iter()
            .map(|mut seats| {
                seats.shuffle(&mut ctx.rng);
                Table::new(seats)
            })
            .collect();
        let accepted = Round::new(tables);
        debug_assert!(accepted.is_partition_of(ctx.config.player_count()));

        debug!(
            round,
            pool = ctx.pool.len(),
            "accepted round partition"
        );
        ctx.append_round(accepted);
        ctx.stats.increment(Counter::RoundsAccepted);
        PredicateResult::SuccessSamePredicate
    }

    fn name(&self) -> &str {
        "Round"
    }
}

/// Select `tables` pairwise-disjoint candidates from `candidates`, tried in
/// the given (pre-shuffled) order.
///
/// Backtracking over an explicit frame stack: each frame holds the options
/// still disjoint from everything chosen above it and a cursor into them.
/// Options are consumed in order, so a given set of tables is tried in one
/// order only; table order within the round carries no meaning here.
fn select_disjoint(candidates: &[Candidate], tables: usize) -> Option<Vec<usize>> {
    struct Frame {
        options: Vec<usize>,
        cursor: usize,
    }

    let mut frames = vec![Frame {
        options: (0..candidates.len()).collect(),
        cursor: 0,
    }];
    let mut chosen: Vec<usize> = Vec::with_capacity(tables);

    loop {
        if chosen.len() == tables {
            return Some(chosen);
        }
        let frame = frames.last_mut().expect("at least the root frame");
        if frame.cursor >= frame.options.len() {
            frames.pop();
            if frames.is_empty() {
                return None;
            }
            chosen.pop();
            continue;
        }

        let pick = frame.options[frame.cursor];
        frame.cursor += 1;
        let mask = candidates[pick].mask();
        let rest: Vec<usize> = frame.options[frame.cursor..]
            .iter()
            .copied()
            .filter(|&i| candidates[i].mask() & mask == 0)
            .collect();
        chosen.push(pick);
        frames.push(Frame {
            options: rest,
            cursor: 0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;

    fn candidate(ids: &[u16]) -> Candidate {
        Candidate::new(ids.iter().map(|&i| Player(i)).collect())
    }

    #[test]
    fn test_select_disjoint_simple() {
        let candidates = vec![
            candidate(&[0, 1, 2, 3]),
            candidate(&[2, 3, 4, 5]),
            candidate(&[4, 5, 6, 7]),
        ];
        let chosen = select_disjoint(&candidates, 2).expect("partition exists");
        assert_eq!(chosen, vec![0, 2]);
    }

    #[test]
    fn test_select_disjoint_requires_backtracking() {
        // Greedy first pick (index 0) blocks both others; the only partition
        // is {1, 2}, reachable after stepping back.
        let candidates = vec![
            candidate(&[0, 1, 4, 5]),
            candidate(&[0, 1, 2, 3]),
            candidate(&[4, 5, 6, 7]),
        ];
        let chosen = select_disjoint(&candidates, 2).expect("partition exists");
        assert_eq!(chosen, vec![1, 2]);
    }

    #[test]
    fn test_select_disjoint_impossible() {
        let candidates = vec![candidate(&[0, 1, 2, 3]), candidate(&[3, 4, 5, 6])];
        assert!(select_disjoint(&candidates, 2).is_none());
    }

    #[test]
    fn test_select_disjoint_not_enough_candidates() {
        let candidates = vec![candidate(&[0, 1, 2, 3])];
        assert!(select_disjoint(&candidates, 2).is_none());
    }

    #[test]
    fn test_try_pred_budgets() {
        let mut ctx = SearchContext::new(SolverConfig::new(2, 3).with_seed(1));
        let mut pred = RoundPredicate::new();

        assert_eq!(pred.try_pred(&mut ctx, 0), PredicateResult::Choices(10));
        assert_eq!(pred.try_pred(&mut ctx, 1), PredicateResult::Choices(10));
        // Final slot gets a single attempt.
        assert_eq!(pred.try_pred(&mut ctx, 2), PredicateResult::Choices(1));
        // Past the end: construction complete.
        assert_eq!(pred.try_pred(&mut ctx, 3), PredicateResult::Success);
    }

    #[test]
    fn test_retry_pred_accepts_a_partition() {
        let mut ctx = SearchContext::new(SolverConfig::new(2, 2).with_seed(7));
        let mut pred = RoundPredicate::new();

        let result = pred.retry_pred(&mut ctx, 0, 0);
        assert_eq!(result, PredicateResult::SuccessSamePredicate);
        assert_eq!(ctx.rounds.len(), 1);
        assert!(ctx.rounds[0].is_partition_of(8));
        // Every seated pair is now spent.
        for table in ctx.rounds[0].tables() {
            for pair in table.pairs() {
                let (p, q) = pair.players();
                assert!(!ctx.conflicts.are_compatible(p, q));
            }
        }
        // The filtered pool only holds compatible candidates.
        for candidate in ctx.pool.as_slice() {
            assert!(candidate.is_compatible(&ctx.conflicts));
        }
    }
}
