use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::PlayerState;
use crate::engine::PlayerBook;
use crate::rating::types::PlayerId;

const PLAYER_COLUMNS: &str =
    "id, rating, matches_played, minor_points_total, major_point_wins, last_updated_at";

pub fn upsert_player(conn: &Connection, state: &PlayerState) -> Result<()> {
    let sql = "INSERT INTO player_states (id, rating, matches_played, minor_points_total, major_point_wins, last_updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(id) DO UPDATE SET
            rating = excluded.rating,
            matches_played = excluded.matches_played,
            minor_points_total = excluded.minor_points_total,
            major_point_wins = excluded.major_point_wins,
            last_updated_at = excluded.last_updated_at";

    conn.execute(
        sql,
        params![
            state.id,
            state.rating,
            state.matches_played,
            state.minor_points_total,
            state.major_point_wins,
            state.last_updated_at
        ],
    )
    .with_context(|| format!("Failed to upsert player {}", state.id))
    .map(|_| ())
}

pub fn upsert_many<'a>(
    conn: &Connection,
    states: impl IntoIterator<Item = &'a PlayerState>,
) -> Result<usize> {
    let mut written = 0;
    for state in states {
        upsert_player(conn, state)?;
        written += 1;
    }
    Ok(written)
}

fn parse_player_row(row: &rusqlite::Row) -> rusqlite::Result<PlayerState> {
    Ok(PlayerState {
        id: row.get(0)?,
        rating: row.get(1)?,
        matches_played: row.get(2)?,
        minor_points_total: row.get(3)?,
        major_point_wins: row.get(4)?,
        last_updated_at: row.get(5)?,
    })
}

pub fn find_by_id(conn: &Connection, id: PlayerId) -> Result<Option<PlayerState>> {
    let sql = format!("SELECT {PLAYER_COLUMNS} FROM player_states WHERE id = ?1");

    conn.query_row(&sql, params![id], parse_player_row)
        .optional()
        .context("Failed to query player by id")
}

/// Loads the players that already exist; unknown ids are simply absent.
pub fn load_book(conn: &Connection, ids: &[PlayerId]) -> Result<PlayerBook> {
    let mut book = PlayerBook::new();
    for &id in ids {
        if let Some(state) = find_by_id(conn, id)? {
            book.insert(id, state);
        }
    }
    Ok(book)
}

pub fn list_by_rating(conn: &Connection, limit: usize) -> Result<Vec<PlayerState>> {
    let sql = format!(
        "SELECT {PLAYER_COLUMNS} FROM player_states ORDER BY rating DESC, id ASC LIMIT ?1"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![limit as i64], parse_player_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn count_all(conn: &Connection) -> Result<usize> {
    conn.query_row("SELECT COUNT(*) FROM player_states", [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|n| n as usize)
    .context("Failed to count players")
}
