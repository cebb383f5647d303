//! Rating workflow configuration
//!
//! The regulation tables themselves are fixed and never configured here.

use crate::rating::settlement::UnknownPlayerPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// How group-stage settlement treats players without a rating
    pub unknown_player_policy: UnknownPlayerPolicy,
    /// Bonus table used for new entrants when the caller does not say
    pub default_wide_range: bool,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            unknown_player_policy: UnknownPlayerPolicy::DefaultToZero,
            default_wide_range: false,
        }
    }
}
