use serde::{Deserialize, Serialize};

use super::points::Points;

pub type PlayerId = i64;
pub type RatingValue = Points;

pub const MIN_PARTICIPANTS: usize = 2;
pub const MAX_PARTICIPANTS: usize = 4;

/// One player's pre-match view, as fed to the rating model.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub player_id: PlayerId,
    pub placement: u8,
    pub rating_before: RatingValue,
    pub matches_played_before: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingChange {
    pub player_id: PlayerId,
    pub rating_after: RatingValue,
    pub rating_delta: RatingValue,
    pub k_factor_used: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    New,
    Established,
}

impl ExperienceLevel {
    pub fn from_matches_played(matches: u32, threshold: u32) -> Self {
        if matches < threshold {
            ExperienceLevel::New
        } else {
            ExperienceLevel::Established
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExperienceLevel::New => "new",
            ExperienceLevel::Established => "established",
        }
    }
}
