// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Candidate pool of valid tables.
//!
//! A candidate is an unordered `table_size`-player subset containing no
//! incompatible pair. The initial pool is every subset of the population; once
//! it runs dry the pool is rebuilt from the residual conflict graph by
//! enumerating maximal cliques (Bron-Kerbosch with pivoting) and decomposing
//! each clique into all of its `table_size`-subsets. Regeneration is the point
//! where pair repeats become structurally possible: a clique of the residual
//! graph only certifies that its own pairs are unspent.

use crate::conflict::ConflictGraph;
use crate::model::{Pair, Player};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// An unordered group of `table_size` players with no known conflicting pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    members: Vec<Player>,
    mask: u128,
}

impl Candidate {
    pub fn new(members: Vec<Player>) -> Self {
        let mask = members
            .iter()
            .fold(0u128, |m, p| m | (1u128 << p.index()));
        debug_assert_eq!(mask.count_ones() as usize, members.len());
        Self { members, mask }
    }

    #[inline]
    pub fn members(&self) -> &[Player] {
        &self.members
    }

    #[inline]
    pub fn mask(&self) -> u128 {
        self.mask
    }

    #[inline]
    pub fn overlaps(&self, other: &Candidate) -> bool {
        self.mask & other.mask != 0
    }

    /// All unordered pairs within the candidate.
    pub fn pairs(&self) -> Vec<Pair> {
        let mut pairs = Vec::with_capacity(self.members.len() * (self.members.len() - 1) / 2);
        for i in 0..self.members.len() {
            for j in i + 1..self.members.len() {
                pairs.push(Pair::new(self.members[i], self.members[j]));
            }
        }
        pairs
    }

    /// Whether every internal pair is still compatible.
    pub fn is_compatible(&self, graph: &ConflictGraph) -> bool {
        for i in 0..self.members.len() {
            for j in i + 1..self.members.len() {
                if !graph.are_compatible(self.members[i], self.members[j]) {
                    return false;
                }
            }
        }
        true
    }
}

/// The set of candidates currently available for building rounds.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
}

impl CandidatePool {
    /// Every `table_size`-subset of the population. This is the pool the
    /// search starts from, while the conflict graph is still complete.
    pub fn complete(player_count: usize, table_size: usize) -> Self {
        let players: Vec<Player> = (0..player_count).map(|p| Player(p as u16)).collect();
        let mut candidates = Vec::new();
        for_each_combination(&players, table_size, &mut |combo| {
            candidates.push(Candidate::new(combo.to_vec()));
        });
        Self { candidates }
    }

    /// Rebuild the pool from the residual conflict graph.
    ///
    /// Enumerates the maximal cliques of the compatibility graph and emits
    /// every `table_size`-subset of each clique of sufficient size, deduped,
    /// with each candidate's member order shuffled.
    pub fn regenerate<R: Rng>(graph: &ConflictGraph, table_size: usize, rng: &mut R) -> Self {
        let n = graph.players();
        let mut adjacency = vec![0u128; n];
        for p in 0..n {
            for q in graph.compatible_neighbors(Player(p as u16)) {
                adjacency[p] |= 1u128 << q.index();
            }
        }

        let mut cliques = Vec::new();
        let all: u128 = if n == 128 { !0 } else { (1u128 << n) - 1 };
        bron_kerbosch(0, all, 0, &adjacency, &mut cliques);

        let mut seen: HashSet<u128> = HashSet::new();
        let mut candidates = Vec::new();
        for clique in cliques {
            if (clique.count_ones() as usize) < table_size {
                continue;
            }
            let members = mask_players(clique);
            for_each_combination(&members, table_size, &mut |combo| {
                let candidate = Candidate::new(combo.to_vec());
                if seen.insert(candidate.mask()) {
                    candidates.push(candidate);
                }
            });
        }
        for candidate in &mut candidates {
            candidate.members.shuffle(rng);
        }
        Self { candidates }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.candidates.shuffle(rng);
    }

    /// Drop every candidate that now contains an incompatible pair.
    pub fn retain_compatible(&mut self, graph: &ConflictGraph) {
        self.candidates.retain(|c| c.is_compatible(graph));
    }
}

/// Call `f` with every `k`-combination of `items`, in lexicographic order.
fn for_each_combination<T: Copy>(items: &[T], k: usize, f: &mut impl FnMut(&[T])) {
    fn recurse<T: Copy>(
        items: &[T],
        k: usize,
        start: usize,
        current: &mut Vec<T>,
        f: &mut impl FnMut(&[T]),
    ) {
        if current.len() == k {
            f(current);
            return;
        }
        let needed = k - current.len();
        for i in start..=items.len().saturating_sub(needed) {
            current.push(items[i]);
            recurse(items, k, i + 1, current, f);
            current.pop();
        }
    }
    if k == 0 || k > items.len() {
        return;
    }
    let mut current = Vec::with_capacity(k);
    recurse(items, k, 0, &mut current, f);
}

/// Bron-Kerbosch maximal clique enumeration with pivoting, on bitmask sets.
fn bron_kerbosch(r: u128, mut p: u128, mut x: u128, adjacency: &[u128], out: &mut Vec<u128>) {
    if p == 0 && x == 0 {
        out.push(r);
        return;
    }

    // Pivot on the vertex of p | x with the most neighbors in p.
    let mut pivot_neighbors = 0u128;
    let mut best = u32::MAX;
    let mut scan = p | x;
    while scan != 0 {
        let u = scan.trailing_zeros() as usize;
        scan &= scan - 1;
        let uncovered = (p & !adjacency[u]).count_ones();
        if best == u32::MAX || uncovered < best {
            best = uncovered;
            pivot_neighbors = adjacency[u];
        }
    }

    let mut candidates = p & !pivot_neighbors;
    while candidates != 0 {
        let v = candidates.trailing_zeros() as usize;
        let vbit = 1u128 << v;
        candidates &= candidates - 1;

        bron_kerbosch(r | vbit, p & adjacency[v], x & adjacency[v], adjacency, out);
        p &= !vbit;
        x |= vbit;
    }
}

fn mask_players(mask: u128) -> Vec<Player> {
    let mut players = Vec::with_capacity(mask.count_ones() as usize);
    let mut bits = mask;
    while bits != 0 {
        players.push(Player(bits.trailing_zeros() as u16));
        bits &= bits - 1;
    }
    players
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn binomial(n: usize, k: usize) -> usize {
        if k > n {
            return 0;
        }
        (1..=k).fold(1, |acc, i| acc * (n - k + i) / i)
    }

    #[test]
    fn test_complete_pool_size() {
        assert_eq!(CandidatePool::complete(8, 4).len(), binomial(8, 4)); // 70
        assert_eq!(CandidatePool::complete(12, 4).len(), binomial(12, 4)); // 495
        assert_eq!(CandidatePool::complete(6, 3).len(), binomial(6, 3)); // 20
    }

    #[test]
    fn test_candidate_overlap() {
        let a = Candidate::new(vec![Player(0), Player(1), Player(2), Player(3)]);
        let b = Candidate::new(vec![Player(4), Player(5), Player(6), Player(7)]);
        let c = Candidate::new(vec![Player(3), Player(4), Player(8), Player(9)]);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn test_retain_compatible() {
        let mut pool = CandidatePool::complete(8, 4);
        let mut graph = ConflictGraph::complete(8);
        graph.remove(Pair::new(Player(0), Player(1)));

        let before = pool.len();
        pool.retain_compatible(&graph);
        // Every candidate containing both 0 and 1 is gone: C(6,2) of them.
        assert_eq!(before - pool.len(), binomial(6, 2));
        for candidate in pool.as_slice() {
            assert!(candidate.is_compatible(&graph));
        }
    }

    #[test]
    fn test_regenerate_on_complete_graph_matches_complete_pool() {
        let graph = ConflictGraph::complete(8);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let pool = CandidatePool::regenerate(&graph, 4, &mut rng);
        // The whole population is one maximal clique.
        assert_eq!(pool.len(), binomial(8, 4));
    }

    #[test]
    fn test_regenerate_respects_removed_edges() {
        let mut graph = ConflictGraph::complete(8);
        graph.remove(Pair::new(Player(0), Player(1)));
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let pool = CandidatePool::regenerate(&graph, 4, &mut rng);

        assert!(!pool.is_empty());
        for candidate in pool.as_slice() {
            assert!(candidate.is_compatible(&graph));
        }
        assert_eq!(pool.len(), binomial(8, 4) - binomial(6, 2));
    }

    #[test]
    fn test_regenerate_empty_when_cliques_too_small() {
        // Keep only a complete bipartite graph: maximal cliques are edges,
        // far below table_size, so no candidate survives.
        let mut graph = ConflictGraph::complete(8);
        for p in 0..4u16 {
            for q in 0..4u16 {
                if p != q {
                    graph.remove(Pair::new(Player(p), Player(q)));
                    graph.remove(Pair::new(Player(p + 4), Player(q + 4)));
                }
            }
        }
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let pool = CandidatePool::regenerate(&graph, 4, &mut rng);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_bron_kerbosch_finds_all_maximal_cliques() {
        // Triangle 0-1-2 plus pendant vertex 3 attached to 2.
        let adjacency = vec![0b0110u128, 0b0101, 0b1011, 0b0100];
        let mut cliques = Vec::new();
        bron_kerbosch(0, 0b1111, 0, &adjacency, &mut cliques);
        cliques.sort_unstable();
        assert_eq!(cliques, vec![0b0111, 0b1100]);
    }
}
