// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Conflict graph over player pairs.
//!
//! The graph starts complete (all pairs compatible) and loses an edge each
//! time two players share a table. During forward search removal is monotone;
//! the only way an edge returns is the trail rewinding a removal on backtrack
//! (see `context`).
//!
//! Rows are `u64` bitset blocks, one row per player, kept symmetric.

use crate::model::{Pair, Player};

#[derive(Debug, Clone)]
pub struct ConflictGraph {
    players: usize,
    /// Words per row.
    words: usize,
    /// `players * words` words; row `p` holds the compatible partners of `p`.
    bits: Vec<u64>,
}

impl ConflictGraph {
    /// A complete compatibility graph over `players` players.
    pub fn complete(players: usize) -> Self {
        let words = players.div_ceil(64);
        let mut graph = Self {
            players,
            words,
            bits: vec![0u64; players * words],
        };
        for p in 0..players {
            for q in 0..players {
                if p != q {
                    graph.set_bit(p, q);
                }
            }
        }
        graph
    }

    #[inline]
    pub fn players(&self) -> usize {
        self.players
    }

    #[inline]
    fn set_bit(&mut self, p: usize, q: usize) {
        self.bits[p * self.words + q / 64] |= 1u64 << (q % 64);
    }

    #[inline]
    fn clear_bit(&mut self, p: usize, q: usize) {
        self.bits[p * self.words + q / 64] &= !(1u64 << (q % 64));
    }

    #[inline]
    fn get_bit(&self, p: usize, q: usize) -> bool {
        self.bits[p * self.words + q / 64] & (1u64 << (q % 64)) != 0
    }

    /// Whether the pair has not yet shared a table.
    pub fn are_compatible(&self, p: Player, q: Player) -> bool {
        self.get_bit(p.index(), q.index())
    }

    /// Mark a pair incompatible. Idempotent; returns whether the edge was
    /// present (the caller trails the removal only when it did something).
    pub fn remove(&mut self, pair: Pair) -> bool {
        let (p, q) = pair.players();
        let present = self.get_bit(p.index(), q.index());
        if present {
            self.clear_bit(p.index(), q.index());
            self.clear_bit(q.index(), p.index());
        }
        present
    }

    /// Restore a removed edge. Only the trail rewind calls this.
    pub fn insert(&mut self, pair: Pair) {
        let (p, q) = pair.players();
        self.set_bit(p.index(), q.index());
        self.set_bit(q.index(), p.index());
    }

    /// Players still compatible with `p`, in index order.
    pub fn compatible_neighbors(&self, p: Player) -> Vec<Player> {
        let row = &self.bits[p.index() * self.words..(p.index() + 1) * self.words];
        let mut neighbors = Vec::new();
        for (w, &word) in row.iter().enumerate() {
            let mut bits = word;
            while bits != 0 {
                let q = w * 64 + bits.trailing_zeros() as usize;
                neighbors.push(Player(q as u16));
                bits &= bits - 1;
            }
        }
        neighbors
    }

    /// Number of players still compatible with `p`.
    pub fn degree(&self, p: Player) -> usize {
        self.bits[p.index() * self.words..(p.index() + 1) * self.words]
            .iter()
            .map(|w| w.count_ones() as usize)
            .sum()
    }
}
