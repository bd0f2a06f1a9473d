use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::usecases::UseCaseError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<UseCaseError> for AppError {
    fn from(err: UseCaseError) -> Self {
        match err {
            UseCaseError::Unauthorized => AppError::Unauthorized,
            UseCaseError::Forbidden(msg) => AppError::Forbidden(msg),
            UseCaseError::NotFound(msg) => AppError::NotFound(msg),
            UseCaseError::BadRequest(msg) => AppError::BadRequest(msg),
            UseCaseError::Conflict(msg) => AppError::Conflict(msg),
            UseCaseError::Internal(err) => AppError::Internal(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(err) => {
                error!(error = ?err, "http: internal error");
                // Don't leak internal error detail to client
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message,
        });

        (status, body).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn use_case_errors_keep_their_status() {
        let cases = [
            (UseCaseError::Unauthorized, StatusCode::UNAUTHORIZED),
            (UseCaseError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (UseCaseError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (UseCaseError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
            (UseCaseError::Conflict("taken".into()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status);
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn internal_errors_hide_their_detail() {
        let response =
            AppError::from(UseCaseError::Internal(anyhow::anyhow!("password=hunter2"))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Internal server error"));
        assert!(!text.contains("hunter2"));
    }
}
