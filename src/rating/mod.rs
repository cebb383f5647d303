//! Table-driven rating engine
//!
//! This module provides the regulation lookup tables, single-match and
//! initial rating calculations, group-stage batch settlement and the storage
//! interface used by callers to persist results.

pub mod calculator;
pub mod settlement;
pub mod storage;
pub mod tables;

// Re-export commonly used types
pub use calculator::{
    calculate_initial_rating, calculate_match_rating, RatingCalculator, RegulationRatingCalculator,
};
pub use settlement::{calculate_group_stage_ratings, settle_group_stage, UnknownPlayerPolicy};
pub use storage::{InMemoryRatingStorage, RatingEntry, RatingStorage};
pub use tables::{bonus_for_rank, lookup, BonusVariant, RatingBracket};
