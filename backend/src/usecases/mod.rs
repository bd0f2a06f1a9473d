pub mod accounts;
pub mod admin_dashboard;
pub mod admin_guard;
pub mod conversations;
pub mod creator;
pub mod gifting;
pub mod live_directory;
pub mod live_room;
pub mod live_streams;
pub mod manage_gift;
pub mod manage_stream;
pub mod manage_user_role;
pub mod messages;
pub mod moderate_video;
pub mod profiles;
pub mod reports;
pub mod settings;
pub mod videos;

use axum::http::StatusCode;
use crates::{
    domain::value_objects::validation::ValidationError,
    realtime::change_feed::{ChangeEvent, ChangeFeed},
};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum UseCaseError {
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
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl UseCaseError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UseCaseError::Unauthorized => StatusCode::UNAUTHORIZED,
            UseCaseError::Forbidden(_) => StatusCode::FORBIDDEN,
            UseCaseError::NotFound(_) => StatusCode::NOT_FOUND,
            UseCaseError::BadRequest(_) => StatusCode::BAD_REQUEST,
            UseCaseError::Conflict(_) => StatusCode::CONFLICT,
            UseCaseError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for UseCaseError {
    fn from(err: ValidationError) -> Self {
        UseCaseError::BadRequest(err.message)
    }
}

pub type UseCaseResult<T> = std::result::Result<T, UseCaseError>;

/// Fans a committed write out to realtime subscribers. A row that fails to encode only
/// costs the notification.
pub fn publish_change(change_feed: &dyn ChangeFeed, event: anyhow::Result<ChangeEvent>) {
    match event {
        Ok(event) => {
            change_feed.publish(event);
        }
        Err(err) => warn!(error = ?err, "realtime: failed to encode change event"),
    }
}
