//! Static lookup tables from the club ranking-points regulation
//!
//! Both tables are plain data so they can be audited against the published
//! regulation and checked for integrity independently of the calculations.

use crate::error::{RatingError, Result};
use crate::types::Rating;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One row of the rating change table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingBracket {
    /// Smallest absolute rating difference covered (inclusive)
    pub min: u64,
    /// Largest absolute rating difference covered (inclusive), `None` = unbounded
    pub max: Option<u64>,
    /// Points exchanged when the higher rated player wins
    pub high_win: Rating,
    /// Points exchanged when the lower rated player wins
    pub low_win: Rating,
}

impl RatingBracket {
    const fn bounded(min: u64, max: u64, high_win: Rating, low_win: Rating) -> Self {
        Self {
            min,
            max: Some(max),
            high_win,
            low_win,
        }
    }

    const fn open(min: u64, high_win: Rating, low_win: Rating) -> Self {
        Self {
            min,
            max: None,
            high_win,
            low_win,
        }
    }

    /// Whether `diff` falls inside this bracket
    pub fn contains(&self, diff: u64) -> bool {
        diff >= self.min && self.max.map_or(true, |max| diff <= max)
    }
}

/// Rating difference brackets, ascending by `min`
pub const RATING_CHANGE_TABLE: [RatingBracket; 11] = [
    RatingBracket::bounded(0, 12, 8, 8),
    RatingBracket::bounded(13, 37, 7, 10),
    RatingBracket::bounded(38, 62, 6, 13),
    RatingBracket::bounded(63, 87, 5, 16),
    RatingBracket::bounded(88, 112, 4, 20),
    RatingBracket::bounded(113, 137, 3, 25),
    RatingBracket::bounded(138, 162, 2, 30),
    RatingBracket::bounded(163, 187, 2, 35),
    RatingBracket::bounded(188, 212, 1, 40),
    RatingBracket::bounded(213, 237, 1, 45),
    RatingBracket::open(238, 0, 50),
];

/// Find the bracket of `table` containing `diff`, if any
pub fn find_bracket(table: &[RatingBracket], diff: u64) -> Option<&RatingBracket> {
    table.iter().find(|bracket| bracket.contains(diff))
}

/// Bracket for an absolute rating difference
///
/// Falls back to the highest bracket if nothing matches, which can only happen
/// if the table itself is broken.
pub fn lookup_bracket(diff: u64) -> &'static RatingBracket {
    match find_bracket(&RATING_CHANGE_TABLE, diff) {
        Some(bracket) => bracket,
        None => {
            warn!(
                "No rating bracket covers difference {}; rating table integrity bug, using highest bracket",
                diff
            );
            &RATING_CHANGE_TABLE[RATING_CHANGE_TABLE.len() - 1]
        }
    }
}

/// `(high_win, low_win)` for an absolute rating difference
pub fn lookup(diff: u64) -> (Rating, Rating) {
    let bracket = lookup_bracket(diff);
    (bracket.high_win, bracket.low_win)
}

/// Check that a rating table partitions `[0, ∞)` and rewards upsets monotonically
pub fn validate_rating_table(table: &[RatingBracket]) -> Result<()> {
    let integrity = |reason: String| RatingError::TableIntegrity { reason };

    let first = table
        .first()
        .ok_or_else(|| integrity("rating table is empty".to_string()))?;
    if first.min != 0 {
        return Err(integrity(format!("first bracket starts at {}, not 0", first.min)).into());
    }

    for (index, bracket) in table.iter().enumerate() {
        if bracket.high_win < 0 || bracket.low_win < 0 {
            return Err(integrity(format!("bracket {} has a negative delta", index)).into());
        }
        if bracket.high_win > bracket.low_win {
            return Err(integrity(format!(
                "bracket {} rewards the expected win ({}) above the upset ({})",
                index, bracket.high_win, bracket.low_win
            ))
            .into());
        }

        let is_last = index + 1 == table.len();
        match (bracket.max, is_last) {
            (None, false) => {
                return Err(integrity(format!("bracket {} is unbounded but not last", index)).into())
            }
            (Some(max), true) => {
                return Err(integrity(format!("last bracket stops at {}", max)).into())
            }
            (Some(max), false) if max < bracket.min => {
                return Err(integrity(format!("bracket {} has max below min", index)).into())
            }
            _ => {}
        }

        if let Some(next) = table.get(index + 1) {
            // `max` is Some here, checked above
            let max = bracket.max.unwrap_or(u64::MAX);
            if next.min != max.saturating_add(1) {
                return Err(integrity(format!(
                    "gap or overlap between bracket {} (max {}) and bracket {} (min {})",
                    index,
                    max,
                    index + 1,
                    next.min
                ))
                .into());
            }
            if next.high_win > bracket.high_win || next.low_win < bracket.low_win {
                return Err(integrity(format!(
                    "bracket {} breaks monotonic deltas",
                    index + 1
                ))
                .into());
            }
        }
    }

    Ok(())
}

/// One row of an initial rating bonus table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialRatingEntry {
    pub rank: u32,
    pub bonus: Rating,
}

const fn entry(rank: u32, bonus: Rating) -> InitialRatingEntry {
    InitialRatingEntry { rank, bonus }
}

/// Group finishing bonus for the usual rating spread
pub const NORMAL_BONUS_TABLE: [InitialRatingEntry; 8] = [
    entry(1, 60),
    entry(2, 55),
    entry(3, 50),
    entry(4, 45),
    entry(5, 40),
    entry(6, 35),
    entry(7, 30),
    entry(8, 25),
];

/// Group finishing bonus when the group has a wide rating spread
pub const WIDE_BONUS_TABLE: [InitialRatingEntry; 8] = [
    entry(1, 150),
    entry(2, 135),
    entry(3, 120),
    entry(4, 105),
    entry(5, 90),
    entry(6, 75),
    entry(7, 60),
    entry(8, 45),
];

/// Which bonus table applies to a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusVariant {
    Normal,
    Wide,
}

impl BonusVariant {
    pub fn from_wide(wide_range: bool) -> Self {
        if wide_range {
            BonusVariant::Wide
        } else {
            BonusVariant::Normal
        }
    }

    pub fn entries(self) -> &'static [InitialRatingEntry] {
        match self {
            BonusVariant::Normal => &NORMAL_BONUS_TABLE,
            BonusVariant::Wide => &WIDE_BONUS_TABLE,
        }
    }

    /// Bonus lost per rank, also used past the end of the table
    pub fn step(self) -> Rating {
        match self {
            BonusVariant::Normal => 5,
            BonusVariant::Wide => 15,
        }
    }
}

impl std::fmt::Display for BonusVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BonusVariant::Normal => write!(f, "normal"),
            BonusVariant::Wide => write!(f, "wide"),
        }
    }
}

/// Linear extrapolation past the last tabulated rank, floored at zero
pub fn extrapolate_bonus(last_bonus: Rating, ranks_past: u32, step: Rating) -> Rating {
    last_bonus
        .saturating_sub(Rating::from(ranks_past).saturating_mul(step))
        .max(0)
}

/// Bonus for a group finishing rank. Rank 0 is treated as rank 1.
pub fn bonus_for_rank(rank: u32, wide_range: bool) -> Rating {
    bonus_for_variant(rank, BonusVariant::from_wide(wide_range))
}

pub fn bonus_for_variant(rank: u32, variant: BonusVariant) -> Rating {
    let rank = rank.max(1);
    let entries = variant.entries();

    if let Some(found) = entries.iter().find(|e| e.rank == rank) {
        return found.bonus;
    }

    let last = entries[entries.len() - 1];
    extrapolate_bonus(last.bonus, rank.saturating_sub(last.rank), variant.step())
}

/// Check that a bonus table is ranked 1..=n and drops by exactly `step` per rank
pub fn validate_bonus_table(entries: &[InitialRatingEntry], step: Rating) -> Result<()> {
    if entries.is_empty() {
        return Err(RatingError::TableIntegrity {
            reason: "bonus table is empty".to_string(),
        }
        .into());
    }

    for (index, e) in entries.iter().enumerate() {
        let expected_rank = index as u32 + 1;
        if e.rank != expected_rank {
            return Err(RatingError::TableIntegrity {
                reason: format!("entry {} has rank {}, expected {}", index, e.rank, expected_rank),
            }
            .into());
        }
        if e.bonus < 0 {
            return Err(RatingError::TableIntegrity {
                reason: format!("rank {} has negative bonus", e.rank),
            }
            .into());
        }
        if let Some(next) = entries.get(index + 1) {
            if e.bonus - next.bonus != step {
                return Err(RatingError::TableIntegrity {
                    reason: format!(
                        "bonus drops by {} between rank {} and {}, expected {}",
                        e.bonus - next.bonus,
                        e.rank,
                        next.rank,
                        step
                    ),
                }
                .into());
            }
        }
    }

    Ok(())
}

/// Validate every built-in table
pub fn validate_builtin_tables() -> Result<()> {
    validate_rating_table(&RATING_CHANGE_TABLE)?;
    for variant in [BonusVariant::Normal, BonusVariant::Wide] {
        validate_bonus_table(variant.entries(), variant.step())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_are_valid() {
        assert!(validate_builtin_tables().is_ok());
    }

    #[test]
    fn test_every_difference_hits_exactly_one_bracket() {
        for diff in (0..=300).chain([10_000, u64::MAX]) {
            let matches = RATING_CHANGE_TABLE
                .iter()
                .filter(|b| b.contains(diff))
                .count();
            assert_eq!(matches, 1, "diff {} matched {} brackets", diff, matches);
        }
    }

    #[test]
    fn test_bracket_boundaries() {
        assert_eq!(lookup(0), (8, 8));
        assert_eq!(lookup(12), (8, 8));
        assert_eq!(lookup(13), (7, 10));
        assert_eq!(lookup(67), (5, 16));
        assert_eq!(lookup(187), (2, 35));
        assert_eq!(lookup(188), (1, 40));
        assert_eq!(lookup(237), (1, 45));
        assert_eq!(lookup(238), (0, 50));
        assert_eq!(lookup(10_000), (0, 50));
    }

    #[test]
    fn test_upset_reward_is_monotonic() {
        for pair in RATING_CHANGE_TABLE.windows(2) {
            assert!(pair[0].high_win <= pair[0].low_win);
            assert!(pair[1].high_win <= pair[0].high_win);
            assert!(pair[1].low_win >= pair[0].low_win);
        }
    }

    #[test]
    fn test_find_bracket_misses_on_broken_table() {
        let broken = [RatingBracket::bounded(0, 10, 8, 8)];
        assert!(find_bracket(&broken, 11).is_none());
        assert!(find_bracket(&broken, 10).is_some());
    }

    #[test]
    fn test_validate_rejects_gap() {
        let table = [
            RatingBracket::bounded(0, 12, 8, 8),
            RatingBracket::open(14, 7, 10),
        ];
        assert!(validate_rating_table(&table).is_err());
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let table = [
            RatingBracket::bounded(0, 12, 8, 8),
            RatingBracket::open(12, 7, 10),
        ];
        assert!(validate_rating_table(&table).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_rewards() {
        let table = [
            RatingBracket::bounded(0, 12, 8, 8),
            RatingBracket::open(13, 10, 7),
        ];
        assert!(validate_rating_table(&table).is_err());
    }

    #[test]
    fn test_validate_rejects_bounded_last_bracket() {
        let table = [RatingBracket::bounded(0, 12, 8, 8)];
        assert!(validate_rating_table(&table).is_err());
        assert!(validate_rating_table(&[]).is_err());
    }

    #[test]
    fn test_tabulated_bonuses() {
        assert_eq!(bonus_for_rank(1, false), 60);
        assert_eq!(bonus_for_rank(8, false), 25);
        assert_eq!(bonus_for_rank(1, true), 150);
        assert_eq!(bonus_for_rank(8, true), 45);
    }

    #[test]
    fn test_bonus_extrapolation() {
        assert_eq!(bonus_for_rank(9, false), 20);
        assert_eq!(bonus_for_rank(10, false), 15);
        assert_eq!(bonus_for_rank(13, false), 0);
        assert_eq!(bonus_for_rank(50, false), 0);

        assert_eq!(bonus_for_rank(9, true), 30);
        assert_eq!(bonus_for_rank(11, true), 0);
        assert_eq!(bonus_for_rank(u32::MAX, true), 0);
    }

    #[test]
    fn test_rank_zero_clamps_to_first() {
        assert_eq!(bonus_for_rank(0, false), 60);
    }

    #[test]
    fn test_bonus_strictly_decreasing_until_floor() {
        for variant in [BonusVariant::Normal, BonusVariant::Wide] {
            let mut previous = bonus_for_variant(1, variant);
            for rank in 2..=30 {
                let bonus = bonus_for_variant(rank, variant);
                assert!(bonus >= 0);
                if previous > 0 {
                    assert!(bonus < previous, "{} rank {}", variant, rank);
                } else {
                    assert_eq!(bonus, 0);
                }
                previous = bonus;
            }
        }
    }

    #[test]
    fn test_validate_bonus_table_rejects_wrong_step() {
        let entries = [entry(1, 60), entry(2, 50)];
        assert!(validate_bonus_table(&entries, 5).is_err());
        assert!(validate_bonus_table(&entries, 10).is_ok());

        let misranked = [entry(2, 60)];
        assert!(validate_bonus_table(&misranked, 5).is_err());
    }
}
