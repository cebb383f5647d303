//! Test fixtures and helper implementations for integration testing

use paddle_rating::config::RatingConfig;
use paddle_rating::rating::settlement::UnknownPlayerPolicy;
use paddle_rating::rating::{InMemoryRatingStorage, RatingCalculator, RegulationRatingCalculator};
use paddle_rating::service::{MatchKind, RankedMatch, RatingService};
use paddle_rating::types::{GroupStageMatch, MatchRatingResult, PlayerId, Rating};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Regulation calculator that records every match it is asked to rate
#[derive(Debug, Default)]
pub struct RecordingRatingCalculator {
    inner: RegulationRatingCalculator,
    calls: Mutex<Vec<(Rating, Rating)>>,
}

impl RecordingRatingCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all (winner, loser) rating pairs seen so far
    pub fn get_calls(&self) -> Vec<(Rating, Rating)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl RatingCalculator for RecordingRatingCalculator {
    fn calculate_match_rating(
        &self,
        winner_rating_before: Rating,
        loser_rating_before: Rating,
    ) -> MatchRatingResult {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((winner_rating_before, loser_rating_before));
        }
        self.inner
            .calculate_match_rating(winner_rating_before, loser_rating_before)
    }

    fn calculate_initial_rating(
        &self,
        base_tier: Rating,
        group_rank: u32,
        wide_range: bool,
    ) -> Rating {
        self.inner
            .calculate_initial_rating(base_tier, group_rank, wide_range)
    }
}

/// Service over fresh in-memory storage
pub fn create_test_service(
    policy: UnknownPlayerPolicy,
) -> (RatingService, Arc<InMemoryRatingStorage>, Arc<RecordingRatingCalculator>) {
    let storage = Arc::new(InMemoryRatingStorage::new());
    let calculator = Arc::new(RecordingRatingCalculator::new());
    let service = RatingService::new(
        storage.clone(),
        calculator.clone(),
        RatingConfig {
            unknown_player_policy: policy,
            default_wide_range: false,
        },
    );
    (service, storage, calculator)
}

pub fn ranked_singles(id: &str, player_a: &str, player_b: &str, winner: &str) -> RankedMatch {
    RankedMatch {
        id: id.to_string(),
        player_a: player_a.to_string(),
        player_b: player_b.to_string(),
        winner_id: winner.to_string(),
        kind: MatchKind::Singles,
        counts_toward_ranking: true,
        is_pickup: false,
    }
}

pub fn ratings(entries: &[(&str, Rating)]) -> BTreeMap<PlayerId, Rating> {
    entries
        .iter()
        .map(|(id, rating)| (id.to_string(), *rating))
        .collect()
}

/// Round robin of a four-player group, results listed in play order
pub fn four_player_group() -> (Vec<GroupStageMatch>, BTreeMap<PlayerId, Rating>) {
    let initial = ratings(&[("A", 2089), ("B", 2022), ("C", 1800), ("D", 1805)]);
    let matches = vec![
        GroupStageMatch::new("r1-1", "B", "A"),
        GroupStageMatch::new("r1-2", "C", "D"),
        GroupStageMatch::new("r2-1", "A", "C"),
        GroupStageMatch::new("r2-2", "B", "D"),
        GroupStageMatch::new("r3-1", "A", "D"),
        GroupStageMatch::new("r3-2", "C", "B"),
    ];
    (matches, initial)
}
