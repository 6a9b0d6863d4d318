use std::collections::HashSet;

use super::points::Points;
use super::scoring::{actual_score, mean_expected_score};
use super::types::{
    ExperienceLevel, Participant, RatingChange, MAX_PARTICIPANTS, MIN_PARTICIPANTS,
};
use crate::config::settings::RatingSettings;
use crate::errors::ValidationError;

/// Computes every participant's rating change for one finished match.
///
/// Each participant is scored against the mean expected score over all of
/// their opponents, and uses their own K-factor, so the deltas of one match
/// do not necessarily sum to zero. The delta is rounded to hundredths and the
/// new rating is `rating_before + delta` with no further rounding. The
/// function is pure: identical inputs always give identical outputs.
pub fn compute_deltas(
    participants: &[Participant],
    config: &RatingSettings,
) -> Result<Vec<RatingChange>, ValidationError> {
    validate_participants(participants)?;

    participants
        .iter()
        .enumerate()
        .map(|(idx, participant)| compute_single_change(idx, participant, participants, config))
        .collect()
}

pub fn validate_participants(participants: &[Participant]) -> Result<(), ValidationError> {
    let count = participants.len();
    if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&count) {
        return Err(ValidationError::InvalidParticipantCount(count));
    }

    let mut placements = HashSet::new();
    let mut players = HashSet::new();

    for participant in participants {
        if participant.placement == 0 || usize::from(participant.placement) > count {
            return Err(ValidationError::InvalidPlacement {
                placement: participant.placement,
                participants: count,
            });
        }
        if !placements.insert(participant.placement) {
            return Err(ValidationError::DuplicatePlacement(participant.placement));
        }
        if !players.insert(participant.player_id) {
            return Err(ValidationError::DuplicatePlayer(participant.player_id));
        }
    }

    Ok(())
}

pub fn k_factor(matches_played_before: u32, config: &RatingSettings) -> f64 {
    match ExperienceLevel::from_matches_played(
        matches_played_before,
        config.established_threshold_matches,
    ) {
        ExperienceLevel::New => config.k_factor_new_player,
        ExperienceLevel::Established => config.k_factor_established_player,
    }
}

fn compute_single_change(
    idx: usize,
    participant: &Participant,
    participants: &[Participant],
    config: &RatingSettings,
) -> Result<RatingChange, ValidationError> {
    let k = k_factor(participant.matches_played_before, config);
    let opponent_ratings = collect_opponent_ratings(idx, participants);
    let expected = mean_expected_score(participant.rating_before.to_f64(), &opponent_ratings);
    // Validated above, so the placement always has a table entry.
    let actual = actual_score(participant.placement, participants.len()).unwrap_or(0.0);

    // A NaN or infinite K-factor from the environment surfaces here.
    let rating_delta = Points::round_from(k * (actual - expected)).ok_or(
        ValidationError::NonFiniteRatingDelta {
            player_id: participant.player_id,
        },
    )?;

    Ok(RatingChange {
        player_id: participant.player_id,
        rating_after: participant.rating_before + rating_delta,
        rating_delta,
        k_factor_used: k,
    })
}

fn collect_opponent_ratings(idx: usize, participants: &[Participant]) -> Vec<f64> {
    participants
        .iter()
        .enumerate()
        .filter(|(other, _)| *other != idx)
        .map(|(_, opponent)| opponent.rating_before.to_f64())
        .collect()
}
