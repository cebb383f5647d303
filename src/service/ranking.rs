//! Caller-side ranking workflows
//!
//! Wraps the pure engine with persistence: first-time entrant registration,
//! two-sided match confirmation with at-most-once rating application, and
//! group-stage settlement.

use crate::config::RatingConfig;
use crate::error::{RatingError, Result};
use crate::rating::calculator::{validate_group_rank, validate_rating, RatingCalculator};
use crate::rating::settlement::settle_group_stage_with;
use crate::rating::storage::{RatingEntry, RatingStorage};
use crate::types::{
    GroupStageMatch, GroupStageSettlement, MatchId, MatchRatingResult, PlayerId, Rating,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Format of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Singles,
    Doubles,
}

/// A played match awaiting confirmation by both participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedMatch {
    pub id: MatchId,
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub winner_id: PlayerId,
    pub kind: MatchKind,
    /// The owning event is flagged as counting toward the ranking
    pub counts_toward_ranking: bool,
    /// Informal pickup game arranged between members
    pub is_pickup: bool,
}

impl RankedMatch {
    pub fn loser_id(&self) -> &PlayerId {
        if self.winner_id == self.player_a {
            &self.player_b
        } else {
            &self.player_a
        }
    }

    pub fn is_participant(&self, player_id: &str) -> bool {
        self.player_a == player_id || self.player_b == player_id
    }

    /// Why this match must not change ratings, if it must not
    pub fn ineligibility_reason(&self) -> Option<&'static str> {
        if self.is_pickup {
            Some("pickup games are unranked")
        } else if !self.counts_toward_ranking {
            Some("event does not count toward ranking")
        } else if self.kind != MatchKind::Singles {
            Some("only singles matches are ranked")
        } else {
            None
        }
    }

    pub fn ensure_eligible(&self) -> Result<()> {
        match self.ineligibility_reason() {
            Some(reason) => Err(RatingError::MatchNotEligible {
                match_id: self.id.clone(),
                reason: reason.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.player_a == self.player_b {
            return Err(RatingError::InvalidInput {
                reason: format!("Match {} has {} on both sides", self.id, self.player_a),
            }
            .into());
        }
        if !self.is_participant(&self.winner_id) {
            return Err(RatingError::InvalidInput {
                reason: format!(
                    "Winner {} of match {} is not a participant",
                    self.winner_id, self.id
                ),
            }
            .into());
        }
        Ok(())
    }
}

/// What a single confirmation did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfirmationOutcome {
    /// The other participant has not confirmed yet
    AwaitingOpponent { waiting_for: PlayerId },
    /// Both confirmed but the match does not affect ratings
    NotRanked { reason: String },
    /// Both confirmed and the rating change was persisted
    Applied { result: MatchRatingResult },
}

/// Registration, confirmation and settlement on top of a rating store
pub struct RatingService {
    storage: Arc<dyn RatingStorage>,
    calculator: Arc<dyn RatingCalculator>,
    config: RatingConfig,
    confirmations: Mutex<HashMap<MatchId, HashSet<PlayerId>>>,
    // Serializes read-compute-write cycles so concurrent matches sharing a
    // player do not lose updates.
    write_lock: Mutex<()>,
}

impl RatingService {
    pub fn new(
        storage: Arc<dyn RatingStorage>,
        calculator: Arc<dyn RatingCalculator>,
        config: RatingConfig,
    ) -> Self {
        Self {
            storage,
            calculator,
            config,
            confirmations: Mutex::new(HashMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| {
            RatingError::InternalError {
                message: "Failed to acquire rating write lock".to_string(),
            }
            .into()
        })
    }

    fn lock_confirmations(&self) -> Result<MutexGuard<'_, HashMap<MatchId, HashSet<PlayerId>>>> {
        self.confirmations.lock().map_err(|_| {
            RatingError::InternalError {
                message: "Failed to acquire confirmations lock".to_string(),
            }
            .into()
        })
    }

    /// Register a first-time competitor with their starting rating
    ///
    /// `wide_range` falls back to the configured default when `None`.
    pub fn register_entrant(
        &self,
        player_id: &str,
        base_tier: Rating,
        group_rank: u32,
        wide_range: Option<bool>,
    ) -> Result<RatingEntry> {
        validate_group_rank(group_rank)?;
        validate_rating(base_tier)?;

        let _guard = self.lock_writes()?;
        let player_id = player_id.to_string();
        if self.storage.get_rating(&player_id)?.is_some() {
            return Err(RatingError::InvalidInput {
                reason: format!("Player {} already has a rating", player_id),
            }
            .into());
        }

        let wide_range = wide_range.unwrap_or(self.config.default_wide_range);
        let rating = self
            .calculator
            .calculate_initial_rating(base_tier, group_rank, wide_range);
        let entry = RatingEntry::new(player_id, rating);
        self.storage.store_rating(entry.clone())?;

        info!(
            "Registered {} at {} (tier {}, group rank {}, wide {})",
            entry.player_id, rating, base_tier, group_rank, wide_range
        );
        Ok(entry)
    }

    /// Record one participant's confirmation of a match result
    ///
    /// The rating change is applied once, when the second participant confirms.
    pub fn confirm_match(
        &self,
        ranked: &RankedMatch,
        confirming_player: &str,
    ) -> Result<ConfirmationOutcome> {
        ranked.validate()?;
        if !ranked.is_participant(confirming_player) {
            return Err(RatingError::InvalidInput {
                reason: format!(
                    "{} did not play in match {}",
                    confirming_player, ranked.id
                ),
            }
            .into());
        }
        // Held for the whole confirmation so a concurrent retry sees the
        // applied marker instead of starting a fresh confirmation round.
        let mut confirmations = self.lock_confirmations()?;
        if self.storage.is_match_applied(&ranked.id)? {
            confirmations.remove(&ranked.id);
            return Err(RatingError::MatchAlreadyApplied {
                match_id: ranked.id.clone(),
            }
            .into());
        }

        let confirmed = confirmations.entry(ranked.id.clone()).or_default();
        confirmed.insert(confirming_player.to_string());

        if confirmed.len() < 2 {
            let waiting_for = if ranked.player_a == confirming_player {
                ranked.player_b.clone()
            } else {
                ranked.player_a.clone()
            };
            debug!(
                "Match {} confirmed by {}, waiting for {}",
                ranked.id, confirming_player, waiting_for
            );
            return Ok(ConfirmationOutcome::AwaitingOpponent { waiting_for });
        }

        confirmations.remove(&ranked.id);
        if let Some(reason) = ranked.ineligibility_reason() {
            debug!("Match {} confirmed but not ranked: {}", ranked.id, reason);
            return Ok(ConfirmationOutcome::NotRanked {
                reason: reason.to_string(),
            });
        }

        let result = self.apply_ranked(ranked)?;
        Ok(ConfirmationOutcome::Applied { result })
    }

    /// Apply a ranked singles result immediately, without waiting for confirmations
    ///
    /// Any confirmation still pending for the match is discarded.
    pub fn apply_result(&self, ranked: &RankedMatch) -> Result<MatchRatingResult> {
        ranked.validate()?;
        ranked.ensure_eligible()?;

        let mut confirmations = self.lock_confirmations()?;
        confirmations.remove(&ranked.id);
        self.apply_ranked(ranked)
    }

    /// Drop a half-confirmed match, e.g. when the opponent never confirms
    ///
    /// Returns whether a confirmation was pending.
    pub fn withdraw_confirmation(&self, match_id: &str) -> Result<bool> {
        let removed = self.lock_confirmations()?.remove(match_id).is_some();
        if removed {
            debug!("Withdrew pending confirmation for match {}", match_id);
        }
        Ok(removed)
    }

    /// Matches confirmed by one participant and waiting for the other
    pub fn pending_confirmations(&self) -> Result<usize> {
        Ok(self.lock_confirmations()?.len())
    }

    // Callers hold the confirmations lock.
    fn apply_ranked(&self, ranked: &RankedMatch) -> Result<MatchRatingResult> {
        let _guard = self.lock_writes()?;
        if self.storage.is_match_applied(&ranked.id)? {
            return Err(RatingError::MatchAlreadyApplied {
                match_id: ranked.id.clone(),
            }
            .into());
        }

        let winner_id = ranked.winner_id.clone();
        let loser_id = ranked.loser_id().clone();

        let mut winner = self.require_entry(&winner_id, &ranked.id)?;
        let mut loser = self.require_entry(&loser_id, &ranked.id)?;

        let result = self
            .calculator
            .calculate_match_rating(winner.rating, loser.rating);
        winner.record_win(result.winner_rating_after);
        loser.record_loss(result.loser_rating_after);

        self.storage.apply_match_result(&ranked.id, winner, loser)?;

        info!(
            "Applied match {}: {} {:+} -> {}, {} {:+} -> {}{}",
            ranked.id,
            winner_id,
            result.winner_change,
            result.winner_rating_after,
            loser_id,
            result.loser_change,
            result.loser_rating_after,
            if result.is_upset { " (upset)" } else { "" }
        );
        Ok(result)
    }

    fn require_entry(&self, player_id: &PlayerId, match_id: &MatchId) -> Result<RatingEntry> {
        self.storage.get_rating(player_id)?.ok_or_else(|| {
            RatingError::UnknownPlayer {
                player_id: player_id.clone(),
                match_id: match_id.clone(),
            }
            .into()
        })
    }

    /// Settle a finished group stage and persist the final ratings
    ///
    /// The batch is applied at most once. It fails with
    /// [`RatingError::MatchAlreadyApplied`] and changes nothing if any of its
    /// matches was already applied, by confirmation or by an earlier settlement.
    pub fn settle_group_stage(&self, matches: &[GroupStageMatch]) -> Result<GroupStageSettlement> {
        let mut confirmations = self.lock_confirmations()?;
        let _guard = self.lock_writes()?;

        let match_ids: Vec<MatchId> = matches.iter().map(|m| m.id.clone()).collect();
        for match_id in &match_ids {
            if self.storage.is_match_applied(match_id)? {
                return Err(RatingError::MatchAlreadyApplied {
                    match_id: match_id.clone(),
                }
                .into());
            }
        }

        let player_ids: Vec<PlayerId> = matches
            .iter()
            .flat_map(|m| [m.winner_id.clone(), m.loser_id.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut entries = self.storage.get_ratings(&player_ids)?;

        let initial: BTreeMap<PlayerId, Rating> = entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.rating))
            .collect();

        let settlement = settle_group_stage_with(
            self.calculator.as_ref(),
            matches,
            &initial,
            self.config.unknown_player_policy,
        )?;

        let updated: Vec<RatingEntry> = settlement
            .final_ratings
            .iter()
            .map(|(id, rating)| match entries.remove(id) {
                Some(mut entry) => {
                    entry.set_rating(*rating);
                    entry
                }
                None => {
                    warn!("Creating rating entry for unregistered player {}", id);
                    RatingEntry::new(id.clone(), *rating)
                }
            })
            .collect();
        self.storage.apply_settlement(&match_ids, updated)?;
        for match_id in &match_ids {
            confirmations.remove(match_id);
        }

        info!(
            "Settled group stage: {} matches, {} players",
            match_ids.len(),
            settlement.final_ratings.len()
        );
        Ok(settlement)
    }

    /// Current standings, highest rating first
    pub fn standings(&self, limit: Option<usize>) -> Result<Vec<RatingEntry>> {
        self.storage.get_standings(limit)
    }
}
