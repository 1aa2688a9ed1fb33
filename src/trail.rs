// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Trail-based backtracking for the construction search.
//!
//! Every reversible effect of accepting a round (conflict edges removed, the
//! candidate pool filtered, the round appended to the partial schedule) is
//! recorded as a typed undo entry. Backtracking rewinds the trail to a
//! checkpoint and plays the entries back in reverse; the `SearchContext` owns
//! the structures the entries refer to and applies the undo (see
//! `SearchContext::rewind_to`).

use crate::model::Pair;
use crate::pool::CandidatePool;

/// One reversible effect of the search.
#[derive(Debug)]
pub enum TrailEntry {
    /// A conflict edge was removed; undo reinserts it.
    PairRemoved(Pair),
    /// The candidate pool was swapped out; undo restores the old pool.
    PoolReplaced(CandidatePool),
    /// A round was appended to the partial schedule; undo pops it.
    RoundAppended,
}

/// The undo log for the construction search.
///
/// A checkpoint is simply the trail length at a choice point. Entries past a
/// checkpoint are popped, last first, when the search backtracks to it.
#[derive(Debug, Default)]
pub struct Trail {
    entries: Vec<TrailEntry>,
}

impl Trail {
    /// Guard against a runaway search; a full run records a handful of
    /// entries per accepted round, nowhere near this.
    const MAX_SIZE: usize = 1 << 20;

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Mark the current position for later rewinding.
    #[inline]
    pub fn checkpoint(&self) -> usize {
        self.entries.len()
    }

    /// Record a reversible effect.
    ///
    /// # Panics
    ///
    /// Panics if the trail exceeds `MAX_SIZE` (indicates a search bug).
    pub fn record(&mut self, entry: TrailEntry) {
        if self.entries.len() >= Self::MAX_SIZE {
            panic!("trail overflow: exceeded {} entries", Self::MAX_SIZE);
        }
        self.entries.push(entry);
    }

    /// Pop the most recent entry, if the trail is longer than `mark`.
    ///
    /// Callers loop this down to a checkpoint, undoing each entry as it comes
    /// off; entries come back newest first.
    pub fn pop_past(&mut self, mark: usize) -> Option<TrailEntry> {
        if self.entries.len() > mark {
            self.entries.pop()
        } else {
            None
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Player;

    #[test]
    fn test_new_trail_is_empty() {
        let trail = Trail::new();
        assert_eq!(trail.len(), 0);
        assert!(trail.is_empty());
        assert_eq!(trail.checkpoint(), 0);
    }

    #[test]
    fn test_record_and_pop_in_reverse_order() {
        let mut trail = Trail::new();
        trail.record(TrailEntry::PairRemoved(Pair::new(Player(0), Player(1))));
        let mark = trail.checkpoint();
        trail.record(TrailEntry::PairRemoved(Pair::new(Player(2), Player(3))));
        trail.record(TrailEntry::RoundAppended);
        assert_eq!(trail.len(), 3);

        // Newest entry first.
        assert!(matches!(
            trail.pop_past(mark),
            Some(TrailEntry::RoundAppended)
        ));
        match trail.pop_past(mark) {
            Some(TrailEntry::PairRemoved(pair)) => {
                assert_eq!(pair, Pair::new(Player(2), Player(3)));
            }
            other => panic!("unexpected entry: {:?}", other),
        }
        // At the checkpoint: nothing more to undo.
        assert!(trail.pop_past(mark).is_none());
        assert_eq!(trail.len(), mark);
    }

    #[test]
    fn test_pop_past_zero_drains_everything() {
        let mut trail = Trail::new();
        trail.record(TrailEntry::RoundAppended);
        trail.record(TrailEntry::RoundAppended);
        let mut popped = 0;
        while trail.pop_past(0).is_some() {
            popped += 1;
        }
        assert_eq!(popped, 2);
        assert!(trail.is_empty());
    }
}
