//! Error types for the rating engine
//!
//! The core calculations are total and never fail. These errors cover boundary
//! validation, strict settlement, table integrity checks, storage and the
//! match confirmation workflow.

use crate::types::{MatchId, PlayerId};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific rating scenarios
#[derive(Debug, thiserror::Error)]
pub enum RatingError {
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Unknown player {player_id} in match {match_id}")]
    UnknownPlayer {
        player_id: PlayerId,
        match_id: MatchId,
    },

    #[error("Match {match_id} has already been applied")]
    MatchAlreadyApplied { match_id: MatchId },

    #[error("Match {match_id} does not count toward ranking: {reason}")]
    MatchNotEligible { match_id: MatchId, reason: String },

    #[error("Rating table integrity violated: {reason}")]
    TableIntegrity { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}
