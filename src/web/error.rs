//! Web error type: every failure a handler can hit ends up as one of
//! the static error pages.

use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::core_state::CoreError;
use crate::db::DatabaseError;
use crate::web::views::{BAD_REQUEST_PAGE, NOT_FOUND_PAGE, SERVER_ERROR_PAGE};

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::BadRequest(detail) => {
                tracing::debug!(detail, "Bad request");
                (StatusCode::BAD_REQUEST, Html(BAD_REQUEST_PAGE)).into_response()
            }
            WebError::NotFound(detail) => {
                tracing::debug!(detail, "Not found");
                (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response()
            }
            WebError::Internal(detail) => {
                tracing::error!(detail, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR_PAGE)).into_response()
            }
        }
    }
}

/// Unreadable form bodies (wrong content type, bad encoding) get the
/// site's own page instead of axum's plain-text rejection.
impl From<FormRejection> for WebError {
    fn from(rejection: FormRejection) -> Self {
        WebError::BadRequest(rejection.body_text())
    }
}

impl From<CoreError> for WebError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Database(e) => e.into(),
            other => WebError::Internal(other.to_string()),
        }
    }
}

impl From<DatabaseError> for WebError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                WebError::NotFound(format!("{entity_type} {id}"))
            }
            other => WebError::Internal(other.to_string()),
        }
    }
}
