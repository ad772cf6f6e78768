//! # StatEntry — Per-Position Aggregate
//!
//! The statistics attached to one position form a commutative monoid:
//!
//! ```text
//! empty()                       identity, no games observed
//! from_game_ref(game)           one game, lifted into an entry
//! combine(a, b)                 associative and commutative
//! ```
//!
//! Because folding is order-independent, concurrent imports can land in any
//! order and the stored result is the same. The store never needs to know
//! what is inside an entry; it only calls `combine`.
//!
//! ## Payload
//!
//! - result tallies (white wins, draws, black wins) and a rating sum, per
//!   time control;
//! - the [`MAX_RECENT_GAMES`] newest games through the position, newest
//!   first. Combining merges both lists and keeps the greatest entries under
//!   a total order, which is associative and commutative as long as every
//!   list is already within the cap.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::config::MAX_RECENT_GAMES;

use super::game::{BySpeed, GameId, GameReference, Outcome, Speed};
use super::month::Month;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Result tallies for one slice of games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub white: u64,
    pub draws: u64,
    pub black: u64,
    /// Sum of the average ratings of all counted games.
    pub rating_sum: u64,
}

impl Stats {
    pub fn single(outcome: Outcome, rating: u16) -> Stats {
        let mut stats = Stats {
            rating_sum: u64::from(rating),
            ..Stats::default()
        };
        match outcome {
            Outcome::WhiteWins => stats.white = 1,
            Outcome::BlackWins => stats.black = 1,
            Outcome::Draw => stats.draws = 1,
        }
        stats
    }

    pub fn total(&self) -> u64 {
        self.white + self.draws + self.black
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn average_rating(&self) -> Option<u64> {
        self.rating_sum.checked_div(self.total())
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Stats) {
        self.white += rhs.white;
        self.draws += rhs.draws;
        self.black += rhs.black;
        self.rating_sum += rhs.rating_sum;
    }
}

impl Add for Stats {
    type Output = Stats;

    fn add(mut self, rhs: Stats) -> Stats {
        self += rhs;
        self
    }
}

// ---------------------------------------------------------------------------
// RecentGame
// ---------------------------------------------------------------------------

/// A game shown in the "recent games" list of a position.
///
/// Ordered by month, then id (the remaining fields only break ties between
/// re-delivered copies of the same game).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecentGame {
    pub month: Month,
    pub id: GameId,
    pub outcome: Outcome,
    pub speed: Speed,
}

impl From<&GameReference> for RecentGame {
    fn from(game: &GameReference) -> RecentGame {
        RecentGame {
            month: game.month,
            id: game.id,
            outcome: game.outcome,
            speed: game.speed,
        }
    }
}

// ---------------------------------------------------------------------------
// StatEntry
// ---------------------------------------------------------------------------

/// Aggregated statistics of one position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEntry {
    by_speed: BySpeed<Stats>,
    /// Newest first, at most [`MAX_RECENT_GAMES`].
    recent: Vec<RecentGame>,
}

impl StatEntry {
    /// The identity: no games observed.
    pub fn empty() -> StatEntry {
        StatEntry::default()
    }

    /// Entry describing exactly one game.
    pub fn from_game_ref(game: &GameReference) -> StatEntry {
        let mut by_speed = BySpeed::<Stats>::default();
        *by_speed.by_speed_mut(game.speed) = Stats::single(game.outcome, game.rating);
        StatEntry {
            by_speed,
            recent: vec![RecentGame::from(game)],
        }
    }

    /// The monoid operation.
    pub fn combine(mut self, other: StatEntry) -> StatEntry {
        self.merge(other);
        self
    }

    /// In-place [`combine`](Self::combine).
    pub fn merge(&mut self, other: StatEntry) {
        self.by_speed.zip_with(other.by_speed, |mine, theirs| *mine += theirs);
        let mine = std::mem::take(&mut self.recent);
        self.recent = merge_recent(mine, other.recent);
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty() && self.by_speed.iter().all(|(_, stats)| stats.is_empty())
    }

    /// Tallies over all speeds.
    pub fn total(&self) -> Stats {
        self.by_speed
            .iter()
            .fold(Stats::default(), |acc, (_, stats)| acc + *stats)
    }

    pub fn by_speed(&self) -> &BySpeed<Stats> {
        &self.by_speed
    }

    pub fn recent_games(&self) -> &[RecentGame] {
        &self.recent
    }

    /// Structural invariants every stored entry satisfies. Checked after
    /// decoding so a corrupt record never masquerades as a valid one.
    pub(crate) fn check_invariants(&self) -> Result<(), &'static str> {
        if self.recent.len() > MAX_RECENT_GAMES {
            return Err("too many recent games");
        }
        if self.recent.windows(2).any(|pair| pair[0] < pair[1]) {
            return Err("recent games out of order");
        }
        Ok(())
    }
}

impl Add for StatEntry {
    type Output = StatEntry;

    fn add(self, rhs: StatEntry) -> StatEntry {
        self.combine(rhs)
    }
}

impl AddAssign for StatEntry {
    fn add_assign(&mut self, rhs: StatEntry) {
        self.merge(rhs);
    }
}

impl Sum for StatEntry {
    fn sum<I: Iterator<Item = StatEntry>>(iter: I) -> StatEntry {
        iter.fold(StatEntry::empty(), StatEntry::combine)
    }
}

/// Merge two newest-first lists, keeping the newest [`MAX_RECENT_GAMES`].
fn merge_recent(a: Vec<RecentGame>, b: Vec<RecentGame>) -> Vec<RecentGame> {
    let mut merged = Vec::with_capacity((a.len() + b.len()).min(MAX_RECENT_GAMES));
    let mut a = a.into_iter().peekable();
    let mut b = b.into_iter().peekable();

    while merged.len() < MAX_RECENT_GAMES {
        let next = match (a.peek(), b.peek()) {
            (Some(x), Some(y)) if x >= y => a.next(),
            (Some(_), Some(_)) => b.next(),
            (Some(_), None) => a.next(),
            (None, Some(_)) => b.next(),
            (None, None) => break,
        };
        merged.extend(next);
    }

    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::testing::{game, reachable_entry};
    use proptest::prelude::*;

    #[test]
    fn empty_is_empty() {
        let entry = StatEntry::empty();
        assert!(entry.is_empty());
        assert_eq!(entry.total(), Stats::default());
        assert!(entry.recent_games().is_empty());
    }

    #[test]
    fn single_game_tallies() {
        let entry = StatEntry::from_game_ref(&game("aaaaaaa1", Outcome::WhiteWins, "2020/01"));
        assert!(!entry.is_empty());
        let total = entry.total();
        assert_eq!((total.white, total.draws, total.black), (1, 0, 0));
        assert_eq!(entry.by_speed().blitz.white, 1);
        assert_eq!(entry.recent_games().len(), 1);
    }

    #[test]
    fn combine_adds_tallies_and_ratings() {
        let mut g1 = game("aaaaaaa1", Outcome::WhiteWins, "2020/01");
        g1.rating = 2000;
        let mut g2 = game("aaaaaaa2", Outcome::Draw, "2020/02");
        g2.rating = 1000;

        let entry = StatEntry::from_game_ref(&g1) + StatEntry::from_game_ref(&g2);
        let total = entry.total();
        assert_eq!((total.white, total.draws, total.black), (1, 1, 0));
        assert_eq!(total.average_rating(), Some(1500));
    }

    #[test]
    fn recent_games_are_newest_first_and_capped() {
        let entry: StatEntry = (0..40u16)
            .map(|i| {
                let mut g = game(&format!("game{:04}", i), Outcome::Draw, "2000/01");
                g.month = g.month.add_months_saturating(i);
                StatEntry::from_game_ref(&g)
            })
            .sum();

        let recent = entry.recent_games();
        assert_eq!(recent.len(), MAX_RECENT_GAMES);
        assert_eq!(recent[0].id.as_str(), "game0039");
        assert_eq!(recent[MAX_RECENT_GAMES - 1].id.as_str(), "game0025");
        assert!(entry.check_invariants().is_ok());
        // Tallies are never truncated.
        assert_eq!(entry.total().draws, 40);
    }

    #[test]
    fn repeated_game_is_counted_twice() {
        let g = game("aaaaaaa1", Outcome::BlackWins, "2020/01");
        let once = StatEntry::from_game_ref(&g);
        let twice = once.clone() + StatEntry::from_game_ref(&g);
        assert_ne!(once, twice);
        assert_eq!(twice.total().black, 2);
        assert_eq!(twice.recent_games().len(), 2);
    }

    #[test]
    fn invariant_check_catches_bad_order() {
        let old = StatEntry::from_game_ref(&game("aaaaaaa1", Outcome::Draw, "2020/01"));
        let new = StatEntry::from_game_ref(&game("aaaaaaa2", Outcome::Draw, "2021/01"));
        let mut entry = old + new;
        entry.recent.reverse();
        assert_eq!(entry.check_invariants(), Err("recent games out of order"));
    }

    proptest! {
        #[test]
        fn identity(a in reachable_entry()) {
            prop_assert_eq!(a.clone().combine(StatEntry::empty()), a.clone());
            prop_assert_eq!(StatEntry::empty().combine(a.clone()), a);
        }

        #[test]
        fn commutative(a in reachable_entry(), b in reachable_entry()) {
            prop_assert_eq!(a.clone().combine(b.clone()), b.combine(a));
        }

        #[test]
        fn associative(a in reachable_entry(), b in reachable_entry(), c in reachable_entry()) {
            let left = a.clone().combine(b.clone()).combine(c.clone());
            let right = a.combine(b.combine(c));
            prop_assert_eq!(left, right);
        }

        #[test]
        fn combined_entries_keep_invariants(a in reachable_entry(), b in reachable_entry()) {
            prop_assert!(a.combine(b).check_invariants().is_ok());
        }
    }
}
