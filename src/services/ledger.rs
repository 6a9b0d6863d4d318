use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDateTime, Utc};
use log::{info, warn};
use rusqlite::{Connection, TransactionBehavior};

use crate::config::settings::RatingSettings;
use crate::database::{self, matches, players, DbPool};
use crate::domain::{
    DeleteOutcome, InsertOutcome, MatchRecord, NewMatch, PlayerState, ReplayScope, ReplaySummary,
};
use crate::engine::{self, out_of_order_warnings, PlayerBook};
use crate::errors::{ConsistencyWarning, MatchId, RatingError, RatingResult, WarningKind};
use crate::rating::types::PlayerId;

/// Single mutation gateway for player and match state.
///
/// Every write runs under one process-wide lock and one IMMEDIATE SQLite
/// transaction: players are global and may appear in several groups, so a
/// narrower lock could let two writers read the same `rating_before`.
pub struct RatingLedger {
    pool: DbPool,
    settings: RatingSettings,
    write_lock: Mutex<()>,
}

impl RatingLedger {
    pub fn open(pool: DbPool, settings: RatingSettings) -> RatingResult<Self> {
        let conn = database::get_connection(&pool)?;
        database::setup::ensure_schema(&conn)?;
        drop(conn);

        Ok(Self {
            pool,
            settings,
            write_lock: Mutex::new(()),
        })
    }

    /// Scores `new_match` against the current ratings and commits it forward.
    pub fn insert_match(&self, new_match: NewMatch) -> RatingResult<InsertOutcome> {
        let _guard = self.lock();
        let mut conn = database::get_connection(&self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = now();

        let player_ids = new_match.player_ids();
        let mut book = players::load_book(&tx, &player_ids)?;
        let slots = engine::score_match(&new_match.participants, &book, &self.settings)?;

        let sequence_number = match new_match.sequence_number {
            Some(seq) => seq,
            None => matches::next_sequence_number(&tx, new_match.group_id)?,
        };
        let mut record = MatchRecord {
            id: 0,
            group_id: new_match.group_id,
            sequence_number,
            played_at: new_match.played_at,
            slots,
        };

        engine::apply_forward(&mut book, &record, &self.settings, now);
        write_book(&tx, &book)?;
        record.id = matches::insert_match(&tx, &record)?;

        let later = matches::players_with_later_matches(&tx, &record)?;
        let warnings = out_of_order_warnings(&record, &later, WarningKind::BackdatedInsert);
        let replayed = self.replay_if_out_of_order(&tx, &warnings, now)?;
        if replayed.is_some() {
            record = matches::find_by_id(&tx, record.id)?.ok_or(RatingError::MatchNotFound(record.id))?;
        }

        tx.commit()?;
        info!(
            "Inserted match {} in group {} with {} players",
            record.id,
            record.group_id,
            record.slots.len()
        );
        log_warnings(&warnings);

        Ok(InsertOutcome {
            record,
            warnings: pending(warnings, replayed),
            replayed,
        })
    }

    /// Reverses `match_id` from its stored snapshot and removes it.
    pub fn delete_match(&self, match_id: MatchId) -> RatingResult<DeleteOutcome> {
        let _guard = self.lock();
        let mut conn = database::get_connection(&self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = now();

        let removed = matches::find_by_id(&tx, match_id)?.ok_or(RatingError::MatchNotFound(match_id))?;
        let player_ids: Vec<PlayerId> = removed.slots.iter().map(|s| s.player_id).collect();

        let later = matches::players_with_later_matches(&tx, &removed)?;
        let warnings = out_of_order_warnings(&removed, &later, WarningKind::DeletedNonLatest);

        let mut book = players::load_book(&tx, &player_ids)?;
        engine::apply_backward(&mut book, &removed, now);
        write_book(&tx, &book)?;
        matches::delete_match(&tx, match_id)?;

        let replayed = self.replay_if_out_of_order(&tx, &warnings, now)?;

        tx.commit()?;
        info!("Deleted match {} from group {}", removed.id, removed.group_id);
        log_warnings(&warnings);

        Ok(DeleteOutcome {
            removed,
            warnings: pending(warnings, replayed),
            replayed,
        })
    }

    /// Replays every match in `scope` from the baseline. Either the whole
    /// replay is committed or nothing is.
    pub fn recalculate(&self, scope: ReplayScope) -> RatingResult<ReplaySummary> {
        let _guard = self.lock();
        let mut conn = database::get_connection(&self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        info!("Recalculating ratings for {}", scope);
        let summary = self.replay_in(&tx, scope, now())?;
        tx.commit()?;

        info!(
            "Recalculation of {} complete: {} matches, {} players reset",
            scope, summary.matches_replayed, summary.players_reset
        );
        Ok(summary)
    }

    pub fn player(&self, player_id: PlayerId) -> RatingResult<PlayerState> {
        let conn = database::get_connection(&self.pool)?;
        players::find_by_id(&conn, player_id)?.ok_or(RatingError::PlayerNotFound(player_id))
    }

    /// The top `limit` players by rating, with the total number of players.
    pub fn leaderboard(&self, limit: usize) -> RatingResult<(Vec<PlayerState>, usize)> {
        let conn = database::get_connection(&self.pool)?;
        let rows = players::list_by_rating(&conn, limit)?;
        let total = players::count_all(&conn)?;
        Ok((rows, total))
    }

    pub fn match_record(&self, match_id: MatchId) -> RatingResult<MatchRecord> {
        let conn = database::get_connection(&self.pool)?;
        matches::find_by_id(&conn, match_id)?.ok_or(RatingError::MatchNotFound(match_id))
    }

    /// The player's matches in chronological order.
    pub fn player_matches(&self, player_id: PlayerId) -> RatingResult<Vec<MatchRecord>> {
        let conn = database::get_connection(&self.pool)?;
        if players::find_by_id(&conn, player_id)?.is_none() {
            return Err(RatingError::PlayerNotFound(player_id));
        }
        let mut records = matches::list_for_player(&conn, player_id)?;
        engine::sort_chronologically(&mut records);
        Ok(records)
    }

    fn replay_in(
        &self,
        conn: &Connection,
        scope: ReplayScope,
        now: NaiveDateTime,
    ) -> RatingResult<ReplaySummary> {
        let records = matches::list_in_scope(conn, scope)?;
        let outcome = engine::replay(&records, &self.settings, now)?;

        for record in &outcome.records {
            matches::update_snapshots(conn, record)?;
        }
        players::upsert_many(conn, &outcome.players)?;

        Ok(outcome.summary)
    }

    fn replay_if_out_of_order(
        &self,
        conn: &Connection,
        warnings: &[ConsistencyWarning],
        now: NaiveDateTime,
    ) -> RatingResult<Option<ReplaySummary>> {
        if warnings.is_empty() || !self.settings.replay_on_out_of_order {
            return Ok(None);
        }
        info!("Out-of-order change detected, replaying all matches");
        self.replay_in(conn, ReplayScope::All, now).map(Some)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn write_book(conn: &Connection, book: &PlayerBook) -> RatingResult<()> {
    players::upsert_many(conn, book.values())?;
    Ok(())
}

/// Warnings already resolved by an automatic replay are not reported.
fn pending(
    warnings: Vec<ConsistencyWarning>,
    replayed: Option<ReplaySummary>,
) -> Vec<ConsistencyWarning> {
    if replayed.is_some() { Vec::new() } else { warnings }
}

fn log_warnings(warnings: &[ConsistencyWarning]) {
    for warning in warnings {
        warn!("{}", warning);
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}
