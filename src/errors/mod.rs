use serde::Serialize;
use thiserror::Error;

use crate::rating::types::PlayerId;

pub type MatchId = i64;

/// Reasons a single match is rejected before any state is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("a match needs 2 to 4 participants, got {0}")]
    InvalidParticipantCount(usize),

    #[error("placement {placement} is out of range for a {participants}-player match")]
    InvalidPlacement { placement: u8, participants: usize },

    #[error("placement {0} is assigned more than once")]
    DuplicatePlacement(u8),

    #[error("player {0} appears more than once in the match")]
    DuplicatePlayer(PlayerId),

    #[error("minor points for player {player_id} are not finite or out of range")]
    NonFiniteMinorPoints { player_id: PlayerId },

    #[error("rating change for player {player_id} is not a finite number")]
    NonFiniteRatingDelta { player_id: PlayerId },
}

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("invalid match: {0}")]
    Validation(#[from] ValidationError),

    #[error("match {0} not found")]
    MatchNotFound(MatchId),

    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    #[error("replay aborted at match {match_id}: {source}")]
    ReplayAborted {
        match_id: MatchId,
        source: ValidationError,
    },

    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RatingError {
    fn from(err: rusqlite::Error) -> Self {
        RatingError::Storage(err.into())
    }
}

pub type RatingResult<T> = Result<T, RatingError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    /// The deleted match was not the player's chronologically latest one.
    DeletedNonLatest,
    /// The inserted match predates a match the player already has.
    BackdatedInsert,
}

/// Non-fatal signal that the incremental path left a player out of step with a
/// chronological replay. Callers decide whether to trigger a recalculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyWarning {
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub kind: WarningKind,
}

impl std::fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            WarningKind::DeletedNonLatest => write!(
                f,
                "match {} was not the latest for player {}; a recalculation is needed",
                self.match_id, self.player_id
            ),
            WarningKind::BackdatedInsert => write!(
                f,
                "match {} predates later matches of player {}; a recalculation is needed",
                self.match_id, self.player_id
            ),
        }
    }
}
