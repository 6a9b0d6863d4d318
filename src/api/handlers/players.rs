use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::{with_ledger, AppState, LeaderboardParams};
use crate::api::errors::ApiError;
use crate::api::models::{LeaderboardItem, LeaderboardResponse, MatchView, PlayerView};

pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, ApiError> {
    let server = &state.config.server;
    let limit = params
        .limit
        .unwrap_or(server.default_page_size)
        .clamp(1, server.max_page_size);

    let (rows, total) = with_ledger(&state, move |ledger| ledger.leaderboard(limit)).await?;
    let settings = &state.config.rating;

    let items = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| LeaderboardItem {
            rank: i + 1,
            player: PlayerView::from_state(row, settings),
        })
        .collect();

    Ok(Json(LeaderboardResponse {
        items,
        limit,
        total,
    }))
}

pub async fn get_player(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let player = with_ledger(&state, move |ledger| ledger.player(player_id)).await?;
    Ok(Json(PlayerView::from_state(player, &state.config.rating)))
}

pub async fn get_player_matches(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let records = with_ledger(&state, move |ledger| ledger.player_matches(player_id)).await?;
    let views: Vec<MatchView> = records.into_iter().map(MatchView::from).collect();
    Ok(Json(views))
}
