// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Error types for the solver.
//!
//! Construction failures are fatal for the whole run: a partial schedule is
//! useless to the balancers, which assume a complete partition per round.
//! The balancers themselves never fail; they report non-convergence through
//! `BalanceReport::converged` instead.

use crate::model::Pair;
use std::error::Error;
use std::fmt;

/// Errors surfaced by schedule construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// The configuration cannot be searched at all.
    InvalidConfig { reason: String },

    /// The backtracking builder spent its retry budget at every depth without
    /// completing the requested number of rounds.
    ConstructionExhausted {
        rounds_built: usize,
        rounds_requested: usize,
    },

    /// A candidate round seated a pair the conflict graph marks incompatible.
    /// Indicates a pool regeneration or edge bookkeeping bug, never retried.
    InternalConsistency { round: usize, pair: Pair },
}

impl SolverError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        SolverError::InvalidConfig {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::InvalidConfig { reason } => {
                write!(f, "invalid configuration: {}", reason)
            }
            SolverError::ConstructionExhausted {
                rounds_built,
                rounds_requested,
            } => {
                write!(
                    f,
                    "construction exhausted: reached {} of {} rounds before the retry budget ran out",
                    rounds_built, rounds_requested
                )
            }
            SolverError::InternalConsistency { round, pair } => {
                write!(
                    f,
                    "internal consistency violation at round {}: candidate seats incompatible pair {}",
                    round, pair
                )
            }
        }
    }
}

impl Error for SolverError {}
