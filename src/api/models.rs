use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::settings::RatingSettings;
use crate::domain::{
    DeleteOutcome, GroupId, InsertOutcome, MatchRecord, ParticipantSlot, PlayerState,
    ReplayScope, ReplaySummary,
};
use crate::errors::ConsistencyWarning;
use crate::rating::types::{ExperienceLevel, PlayerId, RatingValue};
use crate::rating::Points;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub rating: RatingValue,
    pub matches_played: u32,
    pub minor_points_total: Points,
    pub major_point_wins: u32,
    pub experience: String,
    pub last_updated_at: NaiveDateTime,
}

impl PlayerView {
    pub fn from_state(state: PlayerState, settings: &RatingSettings) -> Self {
        let experience = ExperienceLevel::from_matches_played(
            state.matches_played,
            settings.established_threshold_matches,
        );
        Self {
            player_id: state.id,
            rating: state.rating,
            matches_played: state.matches_played,
            minor_points_total: state.minor_points_total,
            major_point_wins: state.major_point_wins,
            experience: experience.as_str().to_string(),
            last_updated_at: state.last_updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardItem {
    pub rank: usize,
    #[serde(flatten)]
    pub player: PlayerView,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub items: Vec<LeaderboardItem>,
    pub limit: usize,
    pub total: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub id: i64,
    pub group_id: GroupId,
    pub sequence_number: i64,
    pub played_at: NaiveDateTime,
    pub major_point_player_id: Option<PlayerId>,
    pub participants: Vec<ParticipantSlot>,
}

impl From<MatchRecord> for MatchView {
    fn from(record: MatchRecord) -> Self {
        Self {
            id: record.id,
            group_id: record.group_id,
            sequence_number: record.sequence_number,
            played_at: record.played_at,
            major_point_player_id: record.major_point_player_id(),
            participants: record.slots,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMutationResponse {
    #[serde(rename = "match")]
    pub record: MatchView,
    pub warnings: Vec<ConsistencyWarning>,
    pub replayed: Option<ReplaySummary>,
}

impl From<InsertOutcome> for MatchMutationResponse {
    fn from(outcome: InsertOutcome) -> Self {
        Self {
            record: outcome.record.into(),
            warnings: outcome.warnings,
            replayed: outcome.replayed,
        }
    }
}

impl From<DeleteOutcome> for MatchMutationResponse {
    fn from(outcome: DeleteOutcome) -> Self {
        Self {
            record: outcome.removed.into(),
            warnings: outcome.warnings,
            replayed: outcome.replayed,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculateParams {
    pub group_id: Option<GroupId>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculateResponse {
    pub scope: String,
    pub matches_replayed: usize,
    pub players_reset: usize,
}

impl RecalculateResponse {
    pub fn new(scope: ReplayScope, summary: ReplaySummary) -> Self {
        Self {
            scope: scope.to_string(),
            matches_replayed: summary.matches_replayed,
            players_reset: summary.players_reset,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}
