// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Local-search balancing of seat and table-number assignments.
//!
//! Both balancers share the same convex exponential scoring: a player's
//! occurrence count for a slot (seat index or table number) is free inside the
//! band `[rounds / slots, ceil(rounds / slots)]` and costs `3^deviation`
//! outside it. The total score is the sum over players; zero means every
//! count sits in the band.
//!
//! Both balancers are greedy best-improvement local searches with a random
//! kick to escape plateaus, and both carry an iteration budget: the loops have
//! no formal convergence guarantee, so when the budget runs out they return
//! the best schedule observed, not the last one visited.

pub mod seats;
pub mod tables;

/// The acceptable occurrence band for `rounds` spread over `slots`.
pub fn band(rounds: usize, slots: usize) -> (u64, u64) {
    let lo = (rounds / slots) as u64;
    let hi = lo + u64::from(rounds % slots != 0);
    (lo, hi)
}

/// `3^deviation` outside the band, 0 inside it.
///
/// Saturates at `u64::MAX` for deviations past 40; the score only has to
/// order schedules, and anything that imbalanced compares as "worst".
pub fn deviation_penalty(count: u64, lo: u64, hi: u64) -> u64 {
    if count < lo {
        3u64.saturating_pow((lo - count) as u32)
    } else if count > hi {
        3u64.saturating_pow((count - hi) as u32)
    } else {
        0
    }
}

/// Sum of deviation penalties over a player's per-slot occurrence counts,
/// saturating rather than wrapping.
pub fn player_penalty(counts: &[u64], lo: u64, hi: u64) -> u64 {
    counts.iter().fold(0u64, |acc, &count| {
        acc.saturating_add(deviation_penalty(count, lo, hi))
    })
}

/// Outcome of one balancing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReport {
    /// Total score of the returned schedule.
    pub score: u64,
    /// Iterations of the main loop actually spent.
    pub iterations: u64,
    /// Whether the target (0 for seats, the threshold for tables) was reached.
    pub converged: bool,
}

/// All permutations of `0..n`, generated by Heap's algorithm.
///
/// `n` is a table size, so the result is tiny (24 entries for the canonical
/// game).
pub(crate) fn permutations(n: usize) -> Vec<Vec<usize>> {
    fn heap(k: usize, items: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if k <= 1 {
            out.push(items.clone());
            return;
        }
        for i in 0..k {
            heap(k - 1, items, out);
            if k % 2 == 0 {
                items.swap(i, k - 1);
            } else {
                items.swap(0, k - 1);
            }
        }
    }
    let mut items: Vec<usize> = (0..n).collect();
    let mut out = Vec::new();
    heap(n, &mut items, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_band() {
        assert_eq!(band(4, 4), (1, 1)); // Exact fit
        assert_eq!(band(13, 4), (3, 4));
        assert_eq!(band(2, 4), (0, 1));
        assert_eq!(band(13, 10), (1, 2));
    }

    #[test]
    fn test_deviation_penalty_zero_inside_band() {
        let (lo, hi) = band(13, 4);
        for count in lo..=hi {
            assert_eq!(deviation_penalty(count, lo, hi), 0);
        }
    }

    #[test]
    fn test_deviation_penalty_exponential_outside_band() {
        assert_eq!(deviation_penalty(2, 0, 1), 3);
        assert_eq!(deviation_penalty(3, 0, 1), 9);
        assert_eq!(deviation_penalty(4, 0, 1), 27);
        assert_eq!(deviation_penalty(0, 2, 3), 9);
        assert_eq!(deviation_penalty(1, 2, 3), 3);
    }

    #[test]
    fn test_player_penalty_zero_iff_all_in_band() {
        let (lo, hi) = band(4, 4);
        assert_eq!(player_penalty(&[1, 1, 1, 1], lo, hi), 0);
        assert_eq!(player_penalty(&[2, 0, 1, 1], lo, hi), 6);

        let (lo, hi) = band(13, 4);
        assert_eq!(player_penalty(&[3, 3, 3, 4], lo, hi), 0);
        assert_eq!(player_penalty(&[5, 4, 3, 1], lo, hi), 3 + 9);
    }

    #[test]
    fn test_penalty_saturates_for_extreme_deviation() {
        // 3^41 exceeds u64; a 90-round schedule stuck on one of two slots
        // reaches deviation 45. The score must clamp, not wrap or panic.
        let (lo, hi) = band(90, 2);
        assert_eq!((lo, hi), (45, 45));
        assert_eq!(deviation_penalty(90, lo, hi), u64::MAX);
        assert_eq!(deviation_penalty(0, lo, hi), u64::MAX);
        assert_eq!(player_penalty(&[90, 0], lo, hi), u64::MAX);
        // Still exact while the exponent fits.
        assert_eq!(deviation_penalty(85, lo, hi), 3u64.pow(40));
    }

    #[test]
    fn test_permutations_complete_and_distinct() {
        let perms = permutations(4);
        assert_eq!(perms.len(), 24);
        let distinct: HashSet<Vec<usize>> = perms.into_iter().collect();
        assert_eq!(distinct.len(), 24);

        assert_eq!(permutations(1), vec![vec![0]]);
        assert_eq!(permutations(2).len(), 2);
    }
}
