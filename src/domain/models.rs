use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::{ConsistencyWarning, MatchId};
use crate::rating::types::{PlayerId, RatingValue};
use crate::rating::Points;

pub type GroupId = i64;

/// Durable per-player aggregate. Only `engine::delta` writes to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: PlayerId,
    pub rating: RatingValue,
    pub matches_played: u32,
    pub minor_points_total: Points,
    pub major_point_wins: u32,
    pub last_updated_at: NaiveDateTime,
}

impl PlayerState {
    pub fn new(id: PlayerId, baseline_rating: RatingValue, now: NaiveDateTime) -> Self {
        Self {
            id,
            rating: baseline_rating,
            matches_played: 0,
            minor_points_total: Points::ZERO,
            major_point_wins: 0,
            last_updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSlot {
    pub player_id: PlayerId,
    pub placement: u8,
    pub minor_points: Points,
    pub rating_before: RatingValue,
    pub rating_after: RatingValue,
    pub rating_delta: RatingValue,
    pub k_factor_used: f64,
}

impl ParticipantSlot {
    pub fn is_winner(&self) -> bool {
        self.placement == 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: MatchId,
    pub group_id: GroupId,
    pub sequence_number: i64,
    pub played_at: NaiveDateTime,
    pub slots: Vec<ParticipantSlot>,
}

impl MatchRecord {
    /// The round winner is always the first-placed participant.
    pub fn major_point_player_id(&self) -> Option<PlayerId> {
        self.slots.iter().find(|s| s.is_winner()).map(|s| s.player_id)
    }

    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.slots.iter().any(|s| s.player_id == player_id)
    }

    pub fn chronological_key(&self) -> (NaiveDateTime, i64, MatchId) {
        (self.played_at, self.sequence_number, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewParticipant {
    pub player_id: PlayerId,
    pub placement: u8,
    #[serde(default)]
    pub minor_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatch {
    pub group_id: GroupId,
    pub played_at: NaiveDateTime,
    #[serde(default)]
    pub sequence_number: Option<i64>,
    pub participants: Vec<NewParticipant>,
}

impl NewMatch {
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.participants.iter().map(|p| p.player_id).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayScope {
    All,
    Group(GroupId),
}

impl ReplayScope {
    pub fn from_group(group_id: Option<GroupId>) -> Self {
        group_id.map_or(ReplayScope::All, ReplayScope::Group)
    }
}

impl std::fmt::Display for ReplayScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayScope::All => write!(f, "all matches"),
            ReplayScope::Group(id) => write!(f, "group {}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
    pub matches_replayed: usize,
    pub players_reset: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub record: MatchRecord,
    pub warnings: Vec<ConsistencyWarning>,
    /// Set when the insert was out of order and a full replay was run instead.
    pub replayed: Option<ReplaySummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub removed: MatchRecord,
    pub warnings: Vec<ConsistencyWarning>,
    pub replayed: Option<ReplaySummary>,
}
