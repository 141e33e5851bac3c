//! Session middleware.
//!
//! `load_session` runs on every route and turns the session and flash
//! cookies into a `SessionContext`. `require_user` guards the staff-only
//! routes and sends anonymous browsers to the login page.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::web::error::WebError;
use crate::web::types::{AppContext, SessionContext, SessionUser};
use crate::web::views::Redirect;

pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to access this page";

/// Resolve the browser's cookies into a `SessionContext`.
///
/// Accesses `AppContext` from request extensions (injected by Extension layer).
pub async fn load_session(req: Request<axum::body::Body>, next: Next) -> Response {
    match load_session_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn load_session_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, WebError> {
    let ctx: AppContext = req
        .extensions()
        .get::<AppContext>()
        .cloned()
        .ok_or(WebError::Internal("missing app context".into()))?;

    let session = SessionContext::from_headers(&ctx.core, req.headers())?;
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

/// Require a logged-in staff member.
///
/// Must run inside `load_session`. On success injects `SessionUser`;
/// otherwise redirects to `/login` with a flash message.
pub async fn require_user(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_user_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_user_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, WebError> {
    let ctx: AppContext = req
        .extensions()
        .get::<AppContext>()
        .cloned()
        .ok_or(WebError::Internal("missing app context".into()))?;
    let session = req
        .extensions()
        .get::<SessionContext>()
        .cloned()
        .ok_or(WebError::Internal("missing session context".into()))?;

    let (Some(username), Some(token)) = (session.user.clone(), session.token.clone()) else {
        tracing::debug!(path = %req.uri().path(), "Anonymous request to protected route");
        return Ok(Redirect::to("/login", &session)
            .flash(LOGIN_REQUIRED_MESSAGE)
            .finish(ctx.core.signer()));
    };

    req.extensions_mut().insert(SessionUser { username, token });
    Ok(next.run(req).await)
}
