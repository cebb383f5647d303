//! Paddle Rating - competitive rating engine for a table-tennis club
//!
//! This crate provides the table-driven rating calculation used for club
//! ranking and seeding, plus the workflows that persist its results.

pub mod config;
pub mod error;
pub mod rating;
pub mod service;
pub mod types;

// Re-export commonly used types and traits
pub use error::{RatingError, Result};
pub use types::*;

// Re-export key components
pub use rating::{
    calculate_group_stage_ratings, calculate_initial_rating, calculate_match_rating,
    RatingCalculator, RegulationRatingCalculator,
};
pub use service::RatingService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
