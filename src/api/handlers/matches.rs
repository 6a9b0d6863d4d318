use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::{with_ledger, AppState};
use crate::api::errors::ApiError;
use crate::api::models::{MatchMutationResponse, MatchView};
use crate::domain::NewMatch;

pub async fn create_match(
    State(state): State<Arc<AppState>>,
    Json(new_match): Json<NewMatch>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = with_ledger(&state, move |ledger| ledger.insert_match(new_match)).await?;
    Ok((StatusCode::CREATED, Json(MatchMutationResponse::from(outcome))))
}

pub async fn get_match(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let record = with_ledger(&state, move |ledger| ledger.match_record(match_id)).await?;
    Ok(Json(MatchView::from(record)))
}

pub async fn delete_match(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = with_ledger(&state, move |ledger| ledger.delete_match(match_id)).await?;
    Ok(Json(MatchMutationResponse::from(outcome)))
}
