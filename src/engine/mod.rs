// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Non-deterministic search engine.
//!
//! The engine runs predicates in sequence over an explicit stack of choice
//! points, coordinating with the context's trail so every backtrack restores
//! the conflict graph, candidate pool, and partial schedule exactly.
//!
//! # Execution model
//!
//! Each stack entry tracks which predicate is executing, its round number,
//! and, once the predicate returned `Choices(n)`, which alternative is being
//! tried. The loop is:
//!
//! 1. Rewind the trail to the entry's checkpoint.
//! 2. Call `try_pred(round)` (or `retry_pred(round, choice)` in choice mode).
//! 3. `Success`: push the next predicate. `SuccessSamePredicate`: push the
//!    same predicate with `round + 1`. `Failure`: pop (backtrack).
//!    `Choices(n)`: enter choice mode. `Suspend`: return the engine, solution
//!    state preserved in the context.
//!
//! Backtracking past the first predicate means the search space is exhausted.
//! A fatal condition flagged on the context (see `SearchContext::set_fatal`)
//! aborts the run immediately instead of backtracking through it.

pub mod predicate;

pub use predicate::{Predicate, PredicateResult, TerminalPredicate};

use crate::context::SearchContext;
use tracing::{debug, trace};

/// Maximum depth of the predicate stack.
const MAX_STACK_SIZE: usize = 1000;

/// Stack entry tracking the state of one predicate execution.
#[derive(Debug)]
struct StackEntry {
    /// Index of the predicate in the predicates list.
    predicate_index: usize,

    /// Current round number (incremented by SuccessSamePredicate).
    round: usize,

    /// Whether try_pred has already run for this entry. A deterministic entry
    /// (one that never offered choices) is popped, not re-run, when the
    /// search backtracks into it.
    tried: bool,

    /// Whether we're in choice mode (exploring alternatives).
    in_choice_mode: bool,

    /// Next choice to try (when in_choice_mode is true).
    current_choice: usize,

    /// Total number of choices (when in_choice_mode is true).
    num_choices: usize,

    /// Trail checkpoint for this stack entry.
    trail_checkpoint: usize,
}

/// Builder enforcing that predicate programs end with a terminal predicate.
#[derive(Default)]
pub struct EngineBuilder {
    predicates: Vec<Box<dyn Predicate>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Append a predicate to the sequence.
    pub fn add(mut self, predicate: Box<dyn Predicate>) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Append the terminal predicate and build the engine.
    pub fn terminal<P: TerminalPredicate + 'static>(mut self, predicate: P) -> SearchEngine {
        self.predicates.push(Box::new(predicate));
        SearchEngine::new(self.predicates)
    }
}

/// Search engine that coordinates predicate execution and backtracking.
pub struct SearchEngine {
    /// List of predicates to execute in sequence.
    predicates: Vec<Box<dyn Predicate>>,

    /// Stack of predicate execution states.
    stack: Vec<StackEntry>,

    /// Statistics: number of try_pred calls.
    try_count: u64,

    /// Statistics: number of retry_pred calls.
    retry_count: u64,
}

impl SearchEngine {
    /// Create an engine with the given predicate sequence.
    ///
    /// The sequence must end with a terminal predicate (one that only fails
    /// or suspends); prefer `EngineBuilder`, which enforces this.
    pub fn new(predicates: Vec<Box<dyn Predicate>>) -> Self {
        Self {
            predicates,
            stack: Vec::with_capacity(MAX_STACK_SIZE),
            try_count: 0,
            retry_count: 0,
        }
    }

    /// Run the search to find one solution.
    ///
    /// Consumes the engine and returns:
    /// - `Some(engine)` if a predicate suspended; the solution state is in
    ///   `ctx`, and the engine can be resumed by calling `search` again;
    /// - `None` if the search exhausted all choices, or a fatal condition was
    ///   flagged on the context.
    ///
    /// # Panics
    ///
    /// Panics if the predicate sequence reaches its end without a terminal
    /// FAIL or SUSPEND, or if the stack exceeds `MAX_STACK_SIZE`.
    pub fn search(mut self, ctx: &mut SearchContext) -> Option<Self> {
        if self.stack.is_empty() {
            // Fresh run (a resumed engine keeps its stack).
            if self.predicates.is_empty() {
                return None;
            }
            self.stack.push(StackEntry {
                predicate_index: 0,
                round: 0,
                tried: false,
                in_choice_mode: false,
                current_choice: 0,
                num_choices: 0,
                trail_checkpoint: ctx.checkpoint(),
            });
        }

        loop {
            if self.stack.is_empty() {
                debug!(
                    tries = self.try_count,
                    retries = self.retry_count,
                    "search exhausted"
                );
                return None;
            }

            let entry = self.stack.last_mut().expect("stack checked non-empty");

            // Restore the state this entry was first reached with.
            ctx.rewind_to(entry.trail_checkpoint);

            let result = if !entry.in_choice_mode {
                if entry.tried {
                    // Backtracked into an entry that had no alternatives.
                    self.stack.pop();
                    continue;
                }
                entry.tried = true;
                let pred_idx = entry.predicate_index;
                let round = entry.round;
                self.try_count += 1;
                let result = self.predicates[pred_idx].try_pred(ctx, round);
                trace!(
                    predicate = self.predicates[pred_idx].name(),
                    round,
                    ?result,
                    "try"
                );
                result
            } else {
                let entry = self.stack.last_mut().expect("stack checked non-empty");
                if entry.current_choice >= entry.num_choices {
                    // All alternatives spent: backtrack.
                    self.stack.pop();
                    continue;
                }
                let pred_idx = entry.predicate_index;
                let round = entry.round;
                let choice = entry.current_choice;
                entry.current_choice += 1;
                self.retry_count += 1;
                let result = self.predicates[pred_idx].retry_pred(ctx, round, choice);
                trace!(
                    predicate = self.predicates[pred_idx].name(),
                    round,
                    choice,
                    ?result,
                    "retry"
                );
                result
            };

            if ctx.is_fatal() {
                return None;
            }

            match result {
                PredicateResult::Success => self.push_next_predicate(ctx),
                PredicateResult::SuccessSamePredicate => self.push_same_predicate(ctx),
                PredicateResult::Failure => {
                    let entry = self.stack.last().expect("stack checked non-empty");
                    if !entry.in_choice_mode {
                        self.stack.pop();
                    }
                    // In choice mode the loop simply advances to the next choice.
                }
                PredicateResult::Choices(n) => {
                    let entry = self.stack.last_mut().expect("stack checked non-empty");
                    if entry.in_choice_mode {
                        panic!("retry_pred returned Choices");
                    }
                    entry.in_choice_mode = true;
                    entry.current_choice = 0;
                    entry.num_choices = n;
                    entry.trail_checkpoint = ctx.checkpoint();
                }
                PredicateResult::Suspend => {
                    let entry = self.stack.last().expect("stack checked non-empty");
                    if entry.in_choice_mode {
                        panic!("retry_pred returned Suspend");
                    }
                    // Pop the suspending entry so a resumed engine continues
                    // the search instead of re-reporting the same solution.
                    self.stack.pop();
                    debug!(
                        tries = self.try_count,
                        retries = self.retry_count,
                        "search suspended"
                    );
                    return Some(self);
                }
            }
        }
    }

    /// Push a new stack entry for the next predicate in sequence.
    fn push_next_predicate(&mut self, ctx: &SearchContext) {
        let current = self.stack.last().expect("push from existing entry");
        let next_index = current.predicate_index + 1;

        if next_index >= self.predicates.len() {
            panic!("invalid predicate sequence: reached end without FAIL or SUSPEND");
        }
        self.push_entry(next_index, 0, ctx);
    }

    /// Push a new stack entry for the same predicate with incremented round.
    fn push_same_predicate(&mut self, ctx: &SearchContext) {
        let current = self.stack.last().expect("push from existing entry");
        self.push_entry(current.predicate_index, current.round + 1, ctx);
    }

    fn push_entry(&mut self, predicate_index: usize, round: usize, ctx: &SearchContext) {
        if self.stack.len() >= MAX_STACK_SIZE {
            panic!("predicate stack overflow: exceeded {} entries", MAX_STACK_SIZE);
        }
        self.stack.push(StackEntry {
            predicate_index,
            round,
            tried: false,
            in_choice_mode: false,
            current_choice: 0,
            num_choices: 0,
            trail_checkpoint: ctx.checkpoint(),
        });
    }

    /// (try_pred calls, retry_pred calls) made so far.
    pub fn statistics(&self) -> (u64, u64) {
        (self.try_count, self.retry_count)
    }
}
