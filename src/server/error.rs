use crate::utils::error::StowageError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error returned by every handler; renders as `{"error": message}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Stowage(#[from] StowageError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Stowage(e) => match e {
                StowageError::ValidationError { .. }
                | StowageError::InvalidValueError { .. }
                | StowageError::SerializationError(_)
                | StowageError::CsvError(_) => StatusCode::BAD_REQUEST,
                StowageError::NotFoundError { .. } => StatusCode::NOT_FOUND,
                StowageError::ConflictError { .. } => StatusCode::CONFLICT,
                StowageError::NoFeasiblePlacement { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("❌ Internal error: {}", self);
            "Internal server error".to_string()
        } else {
            tracing::debug!(status = status.as_u16(), "Request rejected: {}", self);
            self.to_string()
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
