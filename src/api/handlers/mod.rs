use std::sync::Arc;

use serde::Deserialize;

use super::errors::ApiError;
use crate::config::settings::AppConfig;
use crate::errors::{RatingError, RatingResult};
use crate::services::ledger::RatingLedger;

pub mod admin;
pub mod matches;
pub mod players;

pub struct AppState {
    pub ledger: RatingLedger,
    pub config: AppConfig,
}

#[derive(Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<usize>,
}

/// Runs a ledger call off the async runtime; ledger writes hold a blocking lock.
pub async fn with_ledger<T, F>(state: &Arc<AppState>, call: F) -> Result<T, ApiError>
where
    F: FnOnce(&RatingLedger) -> RatingResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || call(&state.ledger))
        .await
        .map_err(|e| ApiError(RatingError::Storage(anyhow::anyhow!("ledger task failed: {e}"))))?
        .map_err(ApiError)
}
