//! Rating storage interface and implementations
//!
//! The engine never persists anything itself. Callers that confirm matches or
//! settle group stages write the results through this interface.

use crate::error::RatingError;
use crate::types::{MatchId, PlayerId, Rating};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Storage entry for a player's rating with metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub player_id: PlayerId,
    pub rating: Rating,
    pub wins: u64,
    pub losses: u64,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RatingEntry {
    /// Create a new rating entry for a new player
    pub fn new(player_id: PlayerId, initial_rating: Rating) -> Self {
        let now = Utc::now();
        Self {
            player_id,
            rating: initial_rating,
            wins: 0,
            losses: 0,
            last_updated: now,
            created_at: now,
        }
    }

    /// Ranked matches played
    pub fn games_played(&self) -> u64 {
        self.wins + self.losses
    }

    /// Replace the rating without touching the win/loss record
    pub fn set_rating(&mut self, new_rating: Rating) {
        self.rating = new_rating;
        self.last_updated = Utc::now();
    }

    pub fn record_win(&mut self, new_rating: Rating) {
        self.set_rating(new_rating);
        self.wins += 1;
    }

    pub fn record_loss(&mut self, new_rating: Rating) {
        self.set_rating(new_rating);
        self.losses += 1;
    }
}

/// Trait for rating storage operations
pub trait RatingStorage: Send + Sync {
    /// Get a player's rating entry
    fn get_rating(&self, player_id: &PlayerId) -> crate::error::Result<Option<RatingEntry>>;

    /// Store or update a player's rating
    fn store_rating(&self, entry: RatingEntry) -> crate::error::Result<()>;

    /// Get ratings for multiple players, skipping unknown ids
    fn get_ratings(
        &self,
        player_ids: &[PlayerId],
    ) -> crate::error::Result<HashMap<PlayerId, RatingEntry>>;

    /// Store multiple rating updates atomically
    fn store_ratings(&self, entries: Vec<RatingEntry>) -> crate::error::Result<()>;

    /// Get all players with ratings
    fn get_all_ratings(&self) -> crate::error::Result<HashMap<PlayerId, RatingEntry>>;

    /// Persist both sides of a confirmed match together with its applied marker
    ///
    /// Fails with [`RatingError::MatchAlreadyApplied`] and writes nothing if the
    /// match was applied before.
    fn apply_match_result(
        &self,
        match_id: &MatchId,
        winner: RatingEntry,
        loser: RatingEntry,
    ) -> crate::error::Result<()>;

    /// Persist a settled batch together with the applied markers of all its matches
    ///
    /// Fails with [`RatingError::MatchAlreadyApplied`] and writes nothing if any
    /// match in the batch was applied before.
    fn apply_settlement(
        &self,
        match_ids: &[MatchId],
        entries: Vec<RatingEntry>,
    ) -> crate::error::Result<()>;

    /// Whether a match's rating change has already been persisted
    fn is_match_applied(&self, match_id: &MatchId) -> crate::error::Result<bool>;

    /// Players ordered by rating (descending) for seeding
    fn get_standings(&self, limit: Option<usize>) -> crate::error::Result<Vec<RatingEntry>>;

    /// Get total number of rated players
    fn get_player_count(&self) -> crate::error::Result<usize>;
}

#[derive(Debug, Default)]
struct StorageState {
    ratings: HashMap<PlayerId, RatingEntry>,
    applied_matches: HashSet<MatchId>,
}

/// In-memory rating storage implementation
#[derive(Debug, Default)]
pub struct InMemoryRatingStorage {
    state: RwLock<StorageState>,
}

impl InMemoryRatingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> crate::error::Result<RwLockReadGuard<'_, StorageState>> {
        self.state.read().map_err(|_| {
            RatingError::InternalError {
                message: "Failed to acquire ratings read lock".to_string(),
            }
            .into()
        })
    }

    fn write(&self) -> crate::error::Result<RwLockWriteGuard<'_, StorageState>> {
        self.state.write().map_err(|_| {
            RatingError::InternalError {
                message: "Failed to acquire ratings write lock".to_string(),
            }
            .into()
        })
    }
}

impl RatingStorage for InMemoryRatingStorage {
    fn get_rating(&self, player_id: &PlayerId) -> crate::error::Result<Option<RatingEntry>> {
        Ok(self.read()?.ratings.get(player_id).cloned())
    }

    fn store_rating(&self, entry: RatingEntry) -> crate::error::Result<()> {
        self.write()?.ratings.insert(entry.player_id.clone(), entry);
        Ok(())
    }

    fn get_ratings(
        &self,
        player_ids: &[PlayerId],
    ) -> crate::error::Result<HashMap<PlayerId, RatingEntry>> {
        let state = self.read()?;

        let mut result = HashMap::new();
        for player_id in player_ids {
            if let Some(entry) = state.ratings.get(player_id) {
                result.insert(player_id.clone(), entry.clone());
            }
        }

        Ok(result)
    }

    fn store_ratings(&self, entries: Vec<RatingEntry>) -> crate::error::Result<()> {
        let mut state = self.write()?;
        for entry in entries {
            state.ratings.insert(entry.player_id.clone(), entry);
        }
        Ok(())
    }

    fn get_all_ratings(&self) -> crate::error::Result<HashMap<PlayerId, RatingEntry>> {
        Ok(self.read()?.ratings.clone())
    }

    fn apply_match_result(
        &self,
        match_id: &MatchId,
        winner: RatingEntry,
        loser: RatingEntry,
    ) -> crate::error::Result<()> {
        let mut state = self.write()?;

        if !state.applied_matches.insert(match_id.clone()) {
            return Err(RatingError::MatchAlreadyApplied {
                match_id: match_id.clone(),
            }
            .into());
        }

        state.ratings.insert(winner.player_id.clone(), winner);
        state.ratings.insert(loser.player_id.clone(), loser);
        Ok(())
    }

    fn apply_settlement(
        &self,
        match_ids: &[MatchId],
        entries: Vec<RatingEntry>,
    ) -> crate::error::Result<()> {
        let mut state = self.write()?;

        if let Some(applied) = match_ids
            .iter()
            .find(|id| state.applied_matches.contains(*id))
        {
            return Err(RatingError::MatchAlreadyApplied {
                match_id: applied.clone(),
            }
            .into());
        }

        state.applied_matches.extend(match_ids.iter().cloned());
        for entry in entries {
            state.ratings.insert(entry.player_id.clone(), entry);
        }
        Ok(())
    }

    fn is_match_applied(&self, match_id: &MatchId) -> crate::error::Result<bool> {
        Ok(self.read()?.applied_matches.contains(match_id))
    }

    fn get_standings(&self, limit: Option<usize>) -> crate::error::Result<Vec<RatingEntry>> {
        let state = self.read()?;

        let mut entries: Vec<RatingEntry> = state.ratings.values().cloned().collect();
        // Ties broken by id so seeding is stable
        entries.sort_by(|a, b| {
            b.rating
                .cmp(&a.rating)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });

        if let Some(limit) = limit {
            entries.truncate(limit);
        }

        Ok(entries)
    }

    fn get_player_count(&self) -> crate::error::Result<usize> {
        Ok(self.read()?.ratings.len())
    }
}
