// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Core schedule data model.
//!
//! A [`Schedule`] is an ordered sequence of [`Round`]s. Each round partitions the
//! full player population into `tables` disjoint [`Table`]s of `table_size`
//! [`Player`]s. Within a table the seat order is significant (index 0..3 maps to
//! seats E/S/W/N for the canonical four-seat game); within a round the table
//! order is significant (the index is the table number).
//!
//! The model is deliberately dumb: construction invariants are enforced by the
//! search (see `predicates::round`), and the balancers only ever permute seat
//! order within a table or table order within a round. The multiset of
//! player-to-table-set assignments is fixed once a round is accepted.

use std::collections::HashMap;
use std::fmt;

/// A player, identified by index into the population `0..player_count`.
///
/// Player bit positions are used throughout for disjointness tests, which is
/// why the population is capped at 128 players (see `SolverConfig::validate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Player(pub u16);

impl Player {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// An unordered pair of distinct players, stored with the smaller index first.
///
/// This is the key of the conflict graph: a pair is "spent" once the two
/// players have shared a table in some round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pair {
    a: Player,
    b: Player,
}

impl Pair {
    /// Create a pair, normalizing order. Panics if `x == y`.
    pub fn new(x: Player, y: Player) -> Self {
        assert!(x != y, "a pair requires two distinct players");
        if x < y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    #[inline]
    pub fn players(self) -> (Player, Player) {
        (self.a, self.b)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.a, self.b)
    }
}

/// One table in one round: an ordered seating of `table_size` players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    seats: Vec<Player>,
}

impl Table {
    pub fn new(seats: Vec<Player>) -> Self {
        debug_assert!(!seats.is_empty());
        Self { seats }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.seats.len()
    }

    #[inline]
    pub fn seats(&self) -> &[Player] {
        &self.seats
    }

    pub fn contains(&self, player: Player) -> bool {
        self.seats.contains(&player)
    }

    /// Seat index (0..table_size) of `player`, if seated here.
    pub fn seat_of(&self, player: Player) -> Option<usize> {
        self.seats.iter().position(|&p| p == player)
    }

    /// Bitmask of occupants, for O(1) disjointness tests.
    pub fn mask(&self) -> u128 {
        self.seats.iter().fold(0u128, |m, p| m | (1u128 << p.index()))
    }

    /// All unordered pairs seated together at this table.
    pub fn pairs(&self) -> Vec<Pair> {
        let mut pairs = Vec::with_capacity(self.seats.len() * (self.seats.len() - 1) / 2);
        for i in 0..self.seats.len() {
            for j in i + 1..self.seats.len() {
                pairs.push(Pair::new(self.seats[i], self.seats[j]));
            }
        }
        pairs
    }

    /// Reseat the occupants: new seat `i` is taken by the player previously at
    /// seat `perm[i]`. `perm` must be a permutation of `0..size`.
    pub fn apply_seat_permutation(&mut self, perm: &[usize]) {
        debug_assert_eq!(perm.len(), self.seats.len());
        let old = self.seats.clone();
        for (i, &from) in perm.iter().enumerate() {
            self.seats[i] = old[from];
        }
    }
}

/// One round: an ordered sequence of tables whose occupants partition the
/// player population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    tables: Vec<Table>,
}

impl Round {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    #[inline]
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table_mut(&mut self, index: usize) -> &mut Table {
        &mut self.tables[index]
    }

    /// Table number occupied by `player` in this round.
    pub fn table_of(&self, player: Player) -> Option<usize> {
        self.tables.iter().position(|t| t.contains(player))
    }

    /// Exchange two table numbers.
    pub fn swap_tables(&mut self, i: usize, j: usize) {
        self.tables.swap(i, j);
    }

    /// Reassign table numbers: new table number `i` is taken by the table
    /// previously numbered `perm[i]`.
    pub fn reorder_tables(&mut self, perm: &[usize]) {
        debug_assert_eq!(perm.len(), self.tables.len());
        let old = self.tables.clone();
        for (i, &from) in perm.iter().enumerate() {
            self.tables[i] = old[from].clone();
        }
    }

    /// Check invariant 1: the tables' player sets are pairwise disjoint and
    /// cover `0..player_count` exactly.
    pub fn is_partition_of(&self, player_count: usize) -> bool {
        let mut seen = 0u128;
        let mut total = 0usize;
        for table in &self.tables {
            let mask = table.mask();
            if seen & mask != 0 {
                return false;
            }
            seen |= mask;
            total += table.size();
        }
        total == player_count && seen.count_ones() as usize == player_count
    }
}

/// A complete schedule: `rounds` rounds in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    rounds: Vec<Round>,
}

impl Schedule {
    pub fn new(rounds: Vec<Round>) -> Self {
        Self { rounds }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    #[inline]
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn round_mut(&mut self, index: usize) -> &mut Round {
        &mut self.rounds[index]
    }

    /// How often `player` occupied each seat index across all rounds.
    pub fn seat_counts(&self, player: Player, table_size: usize) -> Vec<u64> {
        let mut counts = vec![0u64; table_size];
        for round in &self.rounds {
            for table in round.tables() {
                if let Some(seat) = table.seat_of(player) {
                    counts[seat] += 1;
                }
            }
        }
        counts
    }

    /// How often `player` occupied each table number across all rounds.
    pub fn table_counts(&self, player: Player, tables: usize) -> Vec<u64> {
        let mut counts = vec![0u64; tables];
        for round in &self.rounds {
            if let Some(table) = round.table_of(player) {
                counts[table] += 1;
            }
        }
        counts
    }

    /// The table-number sequence of `player`, one entry per round.
    ///
    /// Rounds where the player is absent are skipped, which does not happen
    /// for schedules produced by the builder (every round is a partition).
    pub fn table_sequence(&self, player: Player) -> Vec<u8> {
        self.rounds
            .iter()
            .filter_map(|r| r.table_of(player).map(|t| t as u8))
            .collect()
    }

    /// Number of co-seatings beyond the first, summed over all pairs.
    ///
    /// Zero means no two players ever shared a table twice.
    pub fn pair_repeat_count(&self) -> usize {
        let mut seen: HashMap<Pair, usize> = HashMap::new();
        for round in &self.rounds {
            for table in round.tables() {
                for pair in table.pairs() {
                    *seen.entry(pair).or_insert(0) += 1;
                }
            }
        }
        seen.values().map(|&c| c.saturating_sub(1)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players(ids: &[u16]) -> Vec<Player> {
        ids.iter().map(|&i| Player(i)).collect()
    }

    #[test]
    fn test_pair_normalizes_order() {
        let p = Pair::new(Player(5), Player(2));
        assert_eq!(p.players(), (Player(2), Player(5)));
        assert_eq!(p, Pair::new(Player(2), Player(5)));
    }

    #[test]
    #[should_panic(expected = "distinct")]
    fn test_pair_rejects_self_pair() {
        let _ = Pair::new(Player(3), Player(3));
    }

    #[test]
    fn test_table_pairs_and_mask() {
        let table = Table::new(players(&[0, 1, 2, 3]));
        assert_eq!(table.pairs().len(), 6);
        assert_eq!(table.mask(), 0b1111);
        assert_eq!(table.seat_of(Player(2)), Some(2));
        assert_eq!(table.seat_of(Player(9)), None);
    }

    #[test]
    fn test_seat_permutation() {
        let mut table = Table::new(players(&[10, 11, 12, 13]));
        table.apply_seat_permutation(&[3, 2, 1, 0]);
        assert_eq!(table.seats(), players(&[13, 12, 11, 10]).as_slice());
    }

    #[test]
    fn test_round_partition_check() {
        let good = Round::new(vec![
            Table::new(players(&[0, 1, 2, 3])),
            Table::new(players(&[4, 5, 6, 7])),
        ]);
        assert!(good.is_partition_of(8));
        assert!(!good.is_partition_of(12));

        let overlap = Round::new(vec![
            Table::new(players(&[0, 1, 2, 3])),
            Table::new(players(&[3, 4, 5, 6])),
        ]);
        assert!(!overlap.is_partition_of(8));
    }

    #[test]
    fn test_round_reorder_tables() {
        let mut round = Round::new(vec![
            Table::new(players(&[0, 1, 2, 3])),
            Table::new(players(&[4, 5, 6, 7])),
            Table::new(players(&[8, 9, 10, 11])),
        ]);
        round.reorder_tables(&[2, 0, 1]);
        assert_eq!(round.table_of(Player(8)), Some(0));
        assert_eq!(round.table_of(Player(0)), Some(1));
        assert_eq!(round.table_of(Player(4)), Some(2));
    }

    #[test]
    fn test_schedule_counts() {
        let schedule = Schedule::new(vec![
            Round::new(vec![
                Table::new(players(&[0, 1, 2, 3])),
                Table::new(players(&[4, 5, 6, 7])),
            ]),
            Round::new(vec![
                Table::new(players(&[4, 1, 6, 3])),
                Table::new(players(&[0, 5, 2, 7])),
            ]),
        ]);
        assert_eq!(schedule.seat_counts(Player(0), 4), vec![2, 0, 0, 0]);
        assert_eq!(schedule.seat_counts(Player(1), 4), vec![0, 2, 0, 0]);
        assert_eq!(schedule.table_counts(Player(0), 2), vec![1, 1]);
        assert_eq!(schedule.table_sequence(Player(4)), vec![1, 0]);
    }

    #[test]
    fn test_pair_repeat_count() {
        let no_repeat = Schedule::new(vec![Round::new(vec![
            Table::new(players(&[0, 1, 2, 3])),
            Table::new(players(&[4, 5, 6, 7])),
        ])]);
        assert_eq!(no_repeat.pair_repeat_count(), 0);

        // Same partition twice: every pair repeats once.
        let repeated = Schedule::new(vec![
            Round::new(vec![
                Table::new(players(&[0, 1, 2, 3])),
                Table::new(players(&[4, 5, 6, 7])),
            ]),
            Round::new(vec![
                Table::new(players(&[3, 2, 1, 0])),
                Table::new(players(&[7, 6, 5, 4])),
            ]),
        ]);
        assert_eq!(repeated.pair_repeat_count(), 12);
    }
}
