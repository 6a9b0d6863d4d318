use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::{with_ledger, AppState};
use crate::api::errors::ApiError;
use crate::api::models::{RecalculateParams, RecalculateResponse};
use crate::domain::ReplayScope;

pub async fn recalculate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecalculateParams>,
) -> Result<impl IntoResponse, ApiError> {
    let scope = ReplayScope::from_group(params.group_id);
    log::info!("Recalculation of {} requested", scope);

    let summary = with_ledger(&state, move |ledger| ledger.recalculate(scope)).await?;
    Ok(Json(RecalculateResponse::new(scope, summary)))
}
