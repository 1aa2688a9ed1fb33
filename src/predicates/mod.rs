// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Search predicates.
//!
//! - `round`: the construction search proper, one schedule round per engine
//!   round.
//! - `test`: simple predicates for exercising the engine without the full
//!   construction machinery.
//! - Built-in terminals: `FailPredicate`, `SolvedPredicate`.

pub mod round;

pub use round::RoundPredicate;

use crate::context::SearchContext;
use crate::engine::{Predicate, PredicateResult, TerminalPredicate};

/// Built-in fail predicate.
///
/// Always fails, forcing the engine to exhaust every alternative of the
/// predicates before it. Use as the terminal when the point of a run is to
/// enumerate rather than to stop at the first solution.
#[derive(Debug)]
pub struct FailPredicate;

impl Predicate for FailPredicate {
    fn try_pred(&mut self, _ctx: &mut SearchContext, _round: usize) -> PredicateResult {
        PredicateResult::Failure
    }

    fn retry_pred(
        &mut self,
        _ctx: &mut SearchContext,
        _round: usize,
        _choice: usize,
    ) -> PredicateResult {
        PredicateResult::Failure
    }

    fn name(&self) -> &str {
        "Fail"
    }
}

impl TerminalPredicate for FailPredicate {}

/// Terminal predicate reached once the schedule is complete.
///
/// Suspends the engine: the solution is the `rounds` held by the context, and
/// the suspended engine can be resumed to search for a different schedule.
#[derive(Debug)]
pub struct SolvedPredicate;

impl Predicate for SolvedPredicate {
    fn try_pred(&mut self, _ctx: &mut SearchContext, _round: usize) -> PredicateResult {
        PredicateResult::Suspend
    }

    fn retry_pred(
        &mut self,
        _ctx: &mut SearchContext,
        _round: usize,
        _choice: usize,
    ) -> PredicateResult {
        PredicateResult::Failure
    }

    fn name(&self) -> &str {
        "Solved"
    }
}

impl TerminalPredicate for SolvedPredicate {}
