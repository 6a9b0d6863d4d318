use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use super::models::ErrorBody;
use crate::errors::RatingError;

pub struct ApiError(pub RatingError);

impl From<RatingError> for ApiError {
    fn from(err: RatingError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            RatingError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
            RatingError::ReplayAborted { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "replayAborted"),
            RatingError::MatchNotFound(_) | RatingError::PlayerNotFound(_) => {
                (StatusCode::NOT_FOUND, "notFound")
            }
            RatingError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage"),
        };

        if status.is_server_error() {
            log::error!("Request failed: {:#}", self.0);
        }

        let body = ErrorBody {
            error,
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
