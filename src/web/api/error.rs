use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::web::auth::PermissionError;

#[derive(Debug)]
pub enum ApiError {
    Permission(PermissionError),
    Validation(String),
    NotFound(&'static str),
    Internal(String),
}

impl From<PermissionError> for ApiError {
    fn from(e: PermissionError) -> Self {
        ApiError::Permission(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Permission(e) => e.into_response(),
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_message("validation_failed", &msg)),
            )
                .into_response(),
            ApiError::NotFound(what) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse::new(what))).into_response()
            }
            ApiError::Internal(msg) => {
                log::error!("Scheduling run failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::with_message("scheduling_failed", &msg)),
                )
                    .into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: None,
        }
    }

    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_status_codes() {
        let status = |e: ApiError| e.into_response().status();
        assert_eq!(status(ApiError::Permission(PermissionError)), StatusCode::FORBIDDEN);
        assert_eq!(status(ApiError::Validation("bad".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(ApiError::NotFound("schedule_not_found")), StatusCode::NOT_FOUND);
        assert_eq!(
            status(ApiError::Internal("task panicked".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
