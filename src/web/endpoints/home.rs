use axum::extract::State;
use axum::http::Uri;
use axum::response::Response;
use axum::Extension;

use crate::web::error::WebError;
use crate::web::types::{AppContext, SessionContext};
use crate::web::views::Page;

/// `GET /`: landing page with the login form.
pub async fn landing(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Response, WebError> {
    Page::new("landing.html", &session).render(&ctx.templates)
}

/// Fallback for unrouted paths.
pub async fn not_found(uri: Uri) -> WebError {
    WebError::NotFound(uri.path().to_string())
}
