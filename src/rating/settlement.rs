//! Group-stage batch settlement
//!
//! Folds an ordered list of results over a working ledger of ratings. A
//! player's rating after match k is the input to their next match, so the
//! input order is significant and never rearranged.

use crate::error::{RatingError, Result};
use crate::rating::calculator::{RatingCalculator, RegulationRatingCalculator};
use crate::types::{GroupStageChange, GroupStageMatch, GroupStageSettlement, PlayerId, Rating};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// How settlement treats players missing from the initial ratings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPlayerPolicy {
    /// Start the player at rating 0
    #[default]
    DefaultToZero,
    /// Fail the whole settlement before applying anything
    Reject,
}

impl std::fmt::Display for UnknownPlayerPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnknownPlayerPolicy::DefaultToZero => write!(f, "default_to_zero"),
            UnknownPlayerPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl std::str::FromStr for UnknownPlayerPolicy {
    type Err = RatingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default_to_zero" | "default-to-zero" | "permissive" => {
                Ok(UnknownPlayerPolicy::DefaultToZero)
            }
            "reject" | "strict" => Ok(UnknownPlayerPolicy::Reject),
            other => Err(RatingError::ConfigurationError {
                message: format!("Unknown player policy '{}'", other),
            }),
        }
    }
}

/// Settle a group stage with the regulation tables, defaulting unknown players to 0
pub fn calculate_group_stage_ratings(
    matches: &[GroupStageMatch],
    initial_ratings: &BTreeMap<PlayerId, Rating>,
) -> GroupStageSettlement {
    fold_matches(&RegulationRatingCalculator, matches, initial_ratings)
}

/// Settle a group stage with the regulation tables under `policy`
pub fn settle_group_stage(
    matches: &[GroupStageMatch],
    initial_ratings: &BTreeMap<PlayerId, Rating>,
    policy: UnknownPlayerPolicy,
) -> Result<GroupStageSettlement> {
    settle_group_stage_with(&RegulationRatingCalculator, matches, initial_ratings, policy)
}

/// Validate the batch, then settle it with `calculator`
///
/// Nothing is applied unless every match passes validation.
pub fn settle_group_stage_with<C>(
    calculator: &C,
    matches: &[GroupStageMatch],
    initial_ratings: &BTreeMap<PlayerId, Rating>,
    policy: UnknownPlayerPolicy,
) -> Result<GroupStageSettlement>
where
    C: RatingCalculator + ?Sized,
{
    let mut seen_ids = HashSet::new();
    for m in matches {
        if m.winner_id == m.loser_id {
            return Err(RatingError::InvalidInput {
                reason: format!("Match {} has {} on both sides", m.id, m.winner_id),
            }
            .into());
        }
        if !seen_ids.insert(m.id.as_str()) {
            return Err(RatingError::InvalidInput {
                reason: format!("Match {} appears more than once", m.id),
            }
            .into());
        }
        if policy == UnknownPlayerPolicy::Reject {
            for player_id in [&m.winner_id, &m.loser_id] {
                if !initial_ratings.contains_key(player_id) {
                    return Err(RatingError::UnknownPlayer {
                        player_id: player_id.clone(),
                        match_id: m.id.clone(),
                    }
                    .into());
                }
            }
        }
    }

    let settlement = fold_matches(calculator, matches, initial_ratings);
    info!(
        "Settled group stage: {} matches, {} players, {} upsets",
        settlement.changes.len(),
        settlement.final_ratings.len(),
        settlement.changes.iter().filter(|c| c.is_upset).count()
    );
    Ok(settlement)
}

/// Apply every match in order to a copy of `initial_ratings`
pub fn fold_matches<C>(
    calculator: &C,
    matches: &[GroupStageMatch],
    initial_ratings: &BTreeMap<PlayerId, Rating>,
) -> GroupStageSettlement
where
    C: RatingCalculator + ?Sized,
{
    let mut ledger = initial_ratings.clone();
    let mut changes = Vec::with_capacity(matches.len());

    for m in matches {
        let winner_before = current_rating(&ledger, &m.winner_id, m);
        let loser_before = current_rating(&ledger, &m.loser_id, m);
        let result = calculator.calculate_match_rating(winner_before, loser_before);

        ledger.insert(m.winner_id.clone(), result.winner_rating_after);
        ledger.insert(m.loser_id.clone(), result.loser_rating_after);

        debug!(
            "Applied match {}: {} {:+}, {} {:+}",
            m.id, m.winner_id, result.winner_change, m.loser_id, result.loser_change
        );

        changes.push(GroupStageChange {
            match_id: m.id.clone(),
            winner_id: m.winner_id.clone(),
            loser_id: m.loser_id.clone(),
            winner_rating_before: winner_before,
            winner_rating_after: result.winner_rating_after,
            loser_rating_before: loser_before,
            loser_rating_after: result.loser_rating_after,
            winner_change: result.winner_change,
            loser_change: result.loser_change,
            rating_diff: result.rating_diff,
            is_upset: result.is_upset,
        });
    }

    GroupStageSettlement {
        final_ratings: ledger,
        changes,
    }
}

fn current_rating(
    ledger: &BTreeMap<PlayerId, Rating>,
    player_id: &PlayerId,
    m: &GroupStageMatch,
) -> Rating {
    match ledger.get(player_id) {
        Some(rating) => *rating,
        None => {
            warn!(
                "Player {} in match {} has no rating; starting at 0",
                player_id, m.id
            );
            0
        }
    }
}
