//! Error → HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::PlannerError;

/// Wrapper that converts `PlannerError` into an axum response.
#[derive(Debug)]
pub struct AppError(pub PlannerError);

impl From<PlannerError> for AppError {
    fn from(e: PlannerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Internal details stay in the log.
        let message = match &self.0 {
            PlannerError::Internal(e) => {
                tracing::error!("internal error: {:#}", e);
                "internal server error".to_string()
            }
            other => {
                if status.is_server_error() {
                    tracing::warn!("{}", other);
                }
                other.to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_error_kind() {
        let resp = AppError(PlannerError::not_found("session", 3)).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AppError(PlannerError::Conflict("role exists".into())).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = AppError(PlannerError::Internal(anyhow::anyhow!("pool"))).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
