//! Rating calculator trait and the regulation implementation
//!
//! The regulation calculator is a pure function of its inputs. The trait exists
//! so settlement and the confirmation workflow can be driven by any
//! calculator, for example a recording one in tests.

use crate::error::{RatingError, Result};
use crate::rating::tables::{bonus_for_rank, lookup};
use crate::types::{MatchOutcome, MatchRatingResult, Rating};
use tracing::debug;

/// Trait for calculating rating changes after matches
pub trait RatingCalculator: Send + Sync {
    /// Calculate before/after ratings for one match, winner first
    fn calculate_match_rating(
        &self,
        winner_rating_before: Rating,
        loser_rating_before: Rating,
    ) -> MatchRatingResult;

    /// Starting rating for a first-time entrant
    fn calculate_initial_rating(&self, base_tier: Rating, group_rank: u32, wide_range: bool)
        -> Rating;

    /// Convenience wrapper over [`RatingCalculator::calculate_match_rating`]
    fn calculate_outcome(&self, outcome: &MatchOutcome) -> MatchRatingResult {
        self.calculate_match_rating(outcome.winner_rating_before, outcome.loser_rating_before)
    }
}

/// Calculator backed by the fixed regulation tables
#[derive(Debug, Clone, Copy, Default)]
pub struct RegulationRatingCalculator;

impl RegulationRatingCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl RatingCalculator for RegulationRatingCalculator {
    fn calculate_match_rating(
        &self,
        winner_rating_before: Rating,
        loser_rating_before: Rating,
    ) -> MatchRatingResult {
        calculate_match_rating(winner_rating_before, loser_rating_before)
    }

    fn calculate_initial_rating(
        &self,
        base_tier: Rating,
        group_rank: u32,
        wide_range: bool,
    ) -> Rating {
        calculate_initial_rating(base_tier, group_rank, wide_range)
    }
}

/// Apply one match result to the winner's and loser's ratings
///
/// Equal ratings count as an expected win. The loser never drops below zero.
pub fn calculate_match_rating(
    winner_rating_before: Rating,
    loser_rating_before: Rating,
) -> MatchRatingResult {
    let diff = winner_rating_before.saturating_sub(loser_rating_before);
    let rating_diff = diff.unsigned_abs();
    let (high_win, low_win) = lookup(rating_diff);

    let is_upset = diff < 0;
    let delta = if is_upset { low_win } else { high_win };

    let result = MatchRatingResult {
        winner_change: delta,
        loser_change: -delta,
        winner_rating_after: winner_rating_before.saturating_add(delta),
        loser_rating_after: loser_rating_before.saturating_sub(delta).max(0),
        rating_diff,
        is_upset,
    };

    debug!(
        "Match rating: winner {} -> {}, loser {} -> {} (diff {}, upset {})",
        winner_rating_before,
        result.winner_rating_after,
        loser_rating_before,
        result.loser_rating_after,
        rating_diff,
        is_upset
    );

    result
}

/// Starting rating: declared tier plus the group finishing bonus
pub fn calculate_initial_rating(base_tier: Rating, group_rank: u32, wide_range: bool) -> Rating {
    base_tier.saturating_add(bonus_for_rank(group_rank, wide_range))
}

/// Boundary check for group finishing ranks
pub fn validate_group_rank(group_rank: u32) -> Result<()> {
    if group_rank == 0 {
        return Err(RatingError::InvalidInput {
            reason: "Group rank must be at least 1".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Boundary check for stored or declared ratings
pub fn validate_rating(rating: Rating) -> Result<()> {
    if rating < 0 {
        return Err(RatingError::InvalidInput {
            reason: format!("Rating cannot be negative: {}", rating),
        }
        .into());
    }
    Ok(())
}
