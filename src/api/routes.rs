use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::api::handlers::{
    admin::recalculate,
    matches::{create_match, delete_match, get_match},
    players::{get_leaderboard, get_player, get_player_matches},
    AppState,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/matches", post(create_match))
        .route("/api/matches/:id", get(get_match).delete(delete_match))
        .route("/api/players", get(get_leaderboard))
        .route("/api/players/:id", get(get_player))
        .route("/api/players/:id/matches", get(get_player_matches))
        .route("/api/admin/recalculate", post(recalculate))
        .with_state(state)
}
