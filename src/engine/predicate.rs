// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Predicate trait for the non-deterministic search.
//!
//! The search engine works by trying predicates in sequence. Each predicate
//! represents a choice point in the search space. Predicates can succeed,
//! fail, offer choices, or suspend the run.
//!
//! # Example
//!
//! ```
//! use golfer_search::engine::{Predicate, PredicateResult};
//! use golfer_search::context::SearchContext;
//!
//! struct SimplePredicate;
//!
//! impl Predicate for SimplePredicate {
//!     fn try_pred(&mut self, _ctx: &mut SearchContext, _round: usize) -> PredicateResult {
//!         // Two alternatives to explore via retry_pred.
//!         PredicateResult::Choices(2)
//!     }
//!
//!     fn retry_pred(&mut self, _ctx: &mut SearchContext, _round: usize, choice: usize) -> PredicateResult {
//!         if choice == 0 {
//!             PredicateResult::Failure // First alternative dead-ends.
//!         } else {
//!             PredicateResult::Success
//!         }
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Simple"
//!     }
//! }
//! ```

use crate::context::SearchContext;

/// Result of attempting a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateResult {
    /// Predicate succeeded. Move to the next predicate in sequence.
    Success,

    /// Predicate succeeded but stay at the same predicate with the next round
    /// number. This is how one predicate builds the schedule round by round.
    SuccessSamePredicate,

    /// Predicate has no (more) valid choices. Backtrack.
    Failure,

    /// Predicate has `n` choices to explore.
    /// The engine calls `retry_pred(round, choice)` for each choice in `0..n`.
    Choices(usize),

    /// Suspend execution with state preserved. A suspended engine is how a
    /// completed schedule is reported: the solution lives in the context.
    Suspend,
}

/// A terminal predicate that ends a predicate program.
///
/// Terminal predicates never return `Success`: they fail (forcing the engine
/// to exhaust alternatives) or suspend (reporting a solution). Every valid
/// program ends with one; `EngineBuilder::terminal` enforces this statically.
pub trait TerminalPredicate: Predicate {}

/// Trait for search predicates in the non-deterministic engine.
///
/// The engine calls `try_pred` when first reaching the predicate at a given
/// round, and `retry_pred` once per choice when `try_pred` returned
/// `Choices(n)`. Before every call the engine has rewound the context's trail
/// to the state the predicate was first entered with, so each retry starts
/// from a clean slate.
pub trait Predicate {
    /// Attempt the predicate at `round` for the first time.
    fn try_pred(&mut self, ctx: &mut SearchContext, round: usize) -> PredicateResult;

    /// Attempt alternative `choice` at `round`.
    ///
    /// Must not return `Choices` or `Suspend`.
    fn retry_pred(&mut self, ctx: &mut SearchContext, round: usize, choice: usize)
        -> PredicateResult;

    /// Name for logging.
    fn name(&self) -> &str {
        "Predicate"
    }
}
