use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::config::settings::RatingSettings;
use crate::domain::{MatchRecord, NewParticipant, ParticipantSlot, PlayerState};
use crate::errors::ValidationError;
use crate::rating::types::{Participant, PlayerId};
use crate::rating::{compute_deltas, Points};

/// Working set of player states touched by one operation.
pub type PlayerBook = HashMap<PlayerId, PlayerState>;

/// Scores one match against the current state in `book`.
///
/// Players missing from the book are treated as brand new at the baseline
/// rating. Nothing is mutated; the returned slots are applied separately with
/// [`apply_forward`] so a rejected match never leaves a half-applied book.
pub fn score_match(
    entries: &[NewParticipant],
    book: &PlayerBook,
    config: &RatingSettings,
) -> Result<Vec<ParticipantSlot>, ValidationError> {
    let minor_points = entries
        .iter()
        .map(|entry| {
            Points::round_from(entry.minor_points).ok_or(ValidationError::NonFiniteMinorPoints {
                player_id: entry.player_id,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let seats = entries
        .iter()
        .zip(minor_points)
        .map(|(entry, minor_points)| (entry.player_id, entry.placement, minor_points));
    score_seats(seats, book, config)
}

/// Scores stored slots again against `book`, keeping their placements and
/// minor points.
pub fn rescore_slots(
    slots: &[ParticipantSlot],
    book: &PlayerBook,
    config: &RatingSettings,
) -> Result<Vec<ParticipantSlot>, ValidationError> {
    let seats = slots
        .iter()
        .map(|slot| (slot.player_id, slot.placement, slot.minor_points));
    score_seats(seats, book, config)
}

fn score_seats(
    seats: impl Iterator<Item = (PlayerId, u8, Points)>,
    book: &PlayerBook,
    config: &RatingSettings,
) -> Result<Vec<ParticipantSlot>, ValidationError> {
    let (participants, minor_points): (Vec<Participant>, Vec<Points>) = seats
        .map(|(player_id, placement, minor_points)| {
            (to_participant(player_id, placement, book, config), minor_points)
        })
        .unzip();

    let changes = compute_deltas(&participants, config)?;

    let slots = participants
        .iter()
        .zip(minor_points)
        .zip(changes)
        .map(|((participant, minor_points), change)| ParticipantSlot {
            player_id: participant.player_id,
            placement: participant.placement,
            minor_points,
            rating_before: participant.rating_before,
            rating_after: change.rating_after,
            rating_delta: change.rating_delta,
            k_factor_used: change.k_factor_used,
        })
        .collect();

    Ok(slots)
}

fn to_participant(
    player_id: PlayerId,
    placement: u8,
    book: &PlayerBook,
    config: &RatingSettings,
) -> Participant {
    let (rating_before, matches_played_before) = book
        .get(&player_id)
        .map(|state| (state.rating, state.matches_played))
        .unwrap_or((config.baseline_rating, 0));

    Participant {
        player_id,
        placement,
        rating_before,
        matches_played_before,
    }
}

/// Commits every slot of `record` to the book.
pub fn apply_forward(
    book: &mut PlayerBook,
    record: &MatchRecord,
    config: &RatingSettings,
    now: NaiveDateTime,
) {
    for slot in &record.slots {
        let state = book
            .entry(slot.player_id)
            .or_insert_with(|| PlayerState::new(slot.player_id, config.baseline_rating, now));
        forward_slot(state, slot, now);
    }
}

/// Undoes `record` using its stored pre-match snapshot.
///
/// Only exact when `record` is the latest match of every participant; callers
/// check that with [`crate::engine::consistency`] and warn otherwise.
pub fn apply_backward(book: &mut PlayerBook, record: &MatchRecord, now: NaiveDateTime) {
    for slot in &record.slots {
        if let Some(state) = book.get_mut(&slot.player_id) {
            backward_slot(state, slot, now);
        }
    }
}

fn forward_slot(state: &mut PlayerState, slot: &ParticipantSlot, now: NaiveDateTime) {
    state.rating = slot.rating_after;
    state.matches_played += 1;
    state.minor_points_total += slot.minor_points;
    if slot.is_winner() {
        state.major_point_wins += 1;
    }
    state.last_updated_at = now;
}

fn backward_slot(state: &mut PlayerState, slot: &ParticipantSlot, now: NaiveDateTime) {
    state.rating = slot.rating_before;
    state.matches_played = state.matches_played.saturating_sub(1);
    state.minor_points_total = (state.minor_points_total - slot.minor_points).max(Points::ZERO);
    if slot.is_winner() {
        state.major_point_wins = state.major_point_wins.saturating_sub(1);
    }
    state.last_updated_at = now;
}
