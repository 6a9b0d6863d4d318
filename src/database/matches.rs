use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, ToSql};

use crate::domain::{GroupId, MatchRecord, ParticipantSlot, ReplayScope};
use crate::errors::MatchId;
use crate::rating::types::PlayerId;

const SLOT_COLUMNS: &str = "player_id, placement, minor_points, rating_before, rating_after, rating_delta, k_factor_used";

/// Inserts the match header and its slots, returning the new match id.
pub fn insert_match(conn: &Connection, record: &MatchRecord) -> Result<MatchId> {
    let sql = "INSERT INTO match_records (group_id, sequence_number, played_at) VALUES (?1, ?2, ?3) RETURNING id";

    let id: MatchId = conn
        .query_row(
            sql,
            params![record.group_id, record.sequence_number, record.played_at],
            |row| row.get(0),
        )
        .context("Failed to insert match")?;

    for (idx, slot) in record.slots.iter().enumerate() {
        insert_slot(conn, id, idx, slot)?;
    }

    Ok(id)
}

fn insert_slot(conn: &Connection, match_id: MatchId, idx: usize, slot: &ParticipantSlot) -> Result<()> {
    let sql = format!(
        "INSERT INTO match_slots (match_id, slot_index, {SLOT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
    );

    conn.execute(
        &sql,
        params![
            match_id,
            idx as i64,
            slot.player_id,
            slot.placement,
            slot.minor_points,
            slot.rating_before,
            slot.rating_after,
            slot.rating_delta,
            slot.k_factor_used
        ],
    )
    .with_context(|| format!("Failed to insert slot {} of match {}", idx, match_id))
    .map(|_| ())
}

/// Overwrites the stored before/after/delta snapshot of every slot.
pub fn update_snapshots(conn: &Connection, record: &MatchRecord) -> Result<()> {
    let sql = "UPDATE match_slots SET rating_before = ?1, rating_after = ?2, rating_delta = ?3, k_factor_used = ?4 WHERE match_id = ?5 AND slot_index = ?6";

    for (idx, slot) in record.slots.iter().enumerate() {
        conn.execute(
            sql,
            params![
                slot.rating_before,
                slot.rating_after,
                slot.rating_delta,
                slot.k_factor_used,
                record.id,
                idx as i64
            ],
        )
        .with_context(|| format!("Failed to update snapshot of match {}", record.id))?;
    }

    Ok(())
}

pub fn delete_match(conn: &Connection, id: MatchId) -> Result<bool> {
    conn.execute("DELETE FROM match_slots WHERE match_id = ?1", params![id])
        .context("Failed to delete match slots")?;
    let removed = conn
        .execute("DELETE FROM match_records WHERE id = ?1", params![id])
        .context("Failed to delete match")?;
    Ok(removed > 0)
}

pub fn next_sequence_number(conn: &Connection, group_id: GroupId) -> Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(sequence_number), 0) + 1 FROM match_records WHERE group_id = ?1",
        params![group_id],
        |row| row.get(0),
    )
    .context("Failed to compute next sequence number")
}

struct MatchHeader {
    id: MatchId,
    group_id: GroupId,
    sequence_number: i64,
    played_at: NaiveDateTime,
}

fn parse_header_row(row: &rusqlite::Row) -> rusqlite::Result<MatchHeader> {
    Ok(MatchHeader {
        id: row.get(0)?,
        group_id: row.get(1)?,
        sequence_number: row.get(2)?,
        played_at: row.get(3)?,
    })
}

fn parse_slot_row(row: &rusqlite::Row) -> rusqlite::Result<ParticipantSlot> {
    Ok(ParticipantSlot {
        player_id: row.get(0)?,
        placement: row.get(1)?,
        minor_points: row.get(2)?,
        rating_before: row.get(3)?,
        rating_after: row.get(4)?,
        rating_delta: row.get(5)?,
        k_factor_used: row.get(6)?,
    })
}

fn load_slots(conn: &Connection, match_id: MatchId) -> Result<Vec<ParticipantSlot>> {
    let sql = format!("SELECT {SLOT_COLUMNS} FROM match_slots WHERE match_id = ?1 ORDER BY slot_index");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![match_id], parse_slot_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

fn attach_slots(conn: &Connection, headers: Vec<MatchHeader>) -> Result<Vec<MatchRecord>> {
    headers
        .into_iter()
        .map(|header| {
            let slots = load_slots(conn, header.id)?;
            Ok::<_, anyhow::Error>(MatchRecord {
                id: header.id,
                group_id: header.group_id,
                sequence_number: header.sequence_number,
                played_at: header.played_at,
                slots,
            })
        })
        .collect()
}

pub fn find_by_id(conn: &Connection, id: MatchId) -> Result<Option<MatchRecord>> {
    let sql = "SELECT id, group_id, sequence_number, played_at FROM match_records WHERE id = ?1";

    let header = conn
        .query_row(sql, params![id], parse_header_row)
        .optional()
        .context("Failed to query match by id")?;

    match header {
        Some(header) => Ok(attach_slots(conn, vec![header])?.pop()),
        None => Ok(None),
    }
}

pub fn list_in_scope(conn: &Connection, scope: ReplayScope) -> Result<Vec<MatchRecord>> {
    let headers = match scope {
        ReplayScope::All => {
            let sql = "SELECT id, group_id, sequence_number, played_at FROM match_records ORDER BY id";
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map([], parse_header_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
        ReplayScope::Group(group_id) => {
            let sql = "SELECT id, group_id, sequence_number, played_at FROM match_records WHERE group_id = ?1 ORDER BY id";
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(params![group_id], parse_header_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
    };

    attach_slots(conn, headers).with_context(|| format!("Failed to load matches for {}", scope))
}

/// Every match the player took part in, in storage order.
pub fn list_for_player(conn: &Connection, player_id: PlayerId) -> Result<Vec<MatchRecord>> {
    let sql = "SELECT DISTINCT m.id, m.group_id, m.sequence_number, m.played_at
        FROM match_records m
        JOIN match_slots s ON s.match_id = m.id
        WHERE s.player_id = ?1
        ORDER BY m.id";

    let mut stmt = conn.prepare(sql)?;
    let headers = stmt
        .query_map(params![player_id], parse_header_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    attach_slots(conn, headers)
}

/// Participants of `record` who also play in a match that sorts after it by
/// (played_at, sequence_number, id). `record` itself is never counted.
pub fn players_with_later_matches(conn: &Connection, record: &MatchRecord) -> Result<Vec<PlayerId>> {
    if record.slots.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = (0..record.slots.len())
        .map(|i| format!("?{}", i + 4))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT DISTINCT s.player_id
        FROM match_slots s
        JOIN match_records m ON m.id = s.match_id
        WHERE s.player_id IN ({placeholders})
          AND m.id <> ?1
          AND (m.played_at, m.sequence_number, m.id) > (?2, ?3, ?1)"
    );

    let mut values: Vec<&dyn ToSql> = vec![
        &record.id as &dyn ToSql,
        &record.played_at as &dyn ToSql,
        &record.sequence_number as &dyn ToSql,
    ];
    values.extend(record.slots.iter().map(|slot| &slot.player_id as &dyn ToSql));

    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map(values.as_slice(), |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<PlayerId>>>()
        .with_context(|| format!("Failed to check later matches for match {}", record.id))?;

    Ok(ids)
}
