//! Common types used throughout the rating engine

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Caller-supplied player identifier
pub type PlayerId = String;

/// Caller-supplied match identifier
pub type MatchId = String;

/// Integer rating points
pub type Rating = i64;

/// A single confirmed result with both players' ratings before the match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
    pub winner_rating_before: Rating,
    pub loser_rating_before: Rating,
}

/// Before/after ratings for one match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchRatingResult {
    pub winner_change: Rating,
    pub loser_change: Rating,
    pub winner_rating_after: Rating,
    /// Floored at zero
    pub loser_rating_after: Rating,
    /// Absolute rating difference before the match
    pub rating_diff: u64,
    /// The lower rated player won
    pub is_upset: bool,
}

/// One group-stage result as fed to batch settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStageMatch {
    pub id: MatchId,
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
}

impl GroupStageMatch {
    pub fn new(
        id: impl Into<MatchId>,
        winner_id: impl Into<PlayerId>,
        loser_id: impl Into<PlayerId>,
    ) -> Self {
        Self {
            id: id.into(),
            winner_id: winner_id.into(),
            loser_id: loser_id.into(),
        }
    }
}

/// Audit record for one match applied during batch settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStageChange {
    pub match_id: MatchId,
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
    pub winner_rating_before: Rating,
    pub winner_rating_after: Rating,
    pub loser_rating_before: Rating,
    pub loser_rating_after: Rating,
    pub winner_change: Rating,
    pub loser_change: Rating,
    pub rating_diff: u64,
    pub is_upset: bool,
}

/// Final ratings plus the ordered audit log of a group-stage settlement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStageSettlement {
    pub final_ratings: BTreeMap<PlayerId, Rating>,
    pub changes: Vec<GroupStageChange>,
}
