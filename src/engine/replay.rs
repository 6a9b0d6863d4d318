use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use log::{debug, info};

use super::delta::{apply_forward, rescore_slots, PlayerBook};
use crate::config::settings::RatingSettings;
use crate::domain::{MatchRecord, PlayerState, ReplaySummary};
use crate::errors::{RatingError, RatingResult};
use crate::rating::types::PlayerId;

/// Result of a replay, computed entirely in memory.
///
/// Nothing is persisted until the caller writes `records` and `players`, so an
/// aborted replay leaves the store exactly as it was.
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub records: Vec<MatchRecord>,
    pub players: Vec<PlayerState>,
    pub summary: ReplaySummary,
}

/// Rebuilds ratings from a baseline by folding `matches` in chronological order.
///
/// Every player appearing in `matches` starts again from the baseline, and every
/// record gets a fresh before/after/delta snapshot. Fails with
/// [`RatingError::ReplayAborted`] on the first match the rating model rejects.
pub fn replay(
    matches: &[MatchRecord],
    config: &RatingSettings,
    now: NaiveDateTime,
) -> RatingResult<ReplayOutcome> {
    let mut ordered = matches.to_vec();
    sort_chronologically(&mut ordered);

    let touched = touched_players(&ordered);
    let mut book: PlayerBook = touched
        .iter()
        .map(|&id| (id, PlayerState::new(id, config.baseline_rating, now)))
        .collect();

    for record in ordered.iter_mut() {
        replay_single(record, &mut book, config, now)?;
    }

    let summary = ReplaySummary {
        matches_replayed: ordered.len(),
        players_reset: touched.len(),
    };
    info!(
        "Replayed {} matches across {} players",
        summary.matches_replayed, summary.players_reset
    );

    let mut players: Vec<PlayerState> = book.into_values().collect();
    players.sort_by_key(|p| p.id);

    Ok(ReplayOutcome {
        records: ordered,
        players,
        summary,
    })
}

/// Orders by `(played_at, sequence_number)`, falling back to the match id so the
/// order is total.
pub fn sort_chronologically(matches: &mut [MatchRecord]) {
    matches.sort_by_key(|m| m.chronological_key());
}

fn touched_players(matches: &[MatchRecord]) -> BTreeSet<PlayerId> {
    matches
        .iter()
        .flat_map(|m| m.slots.iter().map(|s| s.player_id))
        .collect()
}

fn replay_single(
    record: &mut MatchRecord,
    book: &mut PlayerBook,
    config: &RatingSettings,
    now: NaiveDateTime,
) -> RatingResult<()> {
    let slots = rescore_slots(&record.slots, book, config).map_err(|source| RatingError::ReplayAborted {
        match_id: record.id,
        source,
    })?;

    record.slots = slots;
    apply_forward(book, record, config, now);
    debug!("Replayed match {} ({} players)", record.id, record.slots.len());
    Ok(())
}
