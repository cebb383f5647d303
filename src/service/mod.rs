//! Service layer for the paddle-rating engine
//!
//! Workflows that sit between callers and storage: entrant registration,
//! match confirmation and group-stage settlement.

pub mod ranking;

pub use ranking::{ConfirmationOutcome, MatchKind, RankedMatch, RatingService};
