//! Access logging middleware.
//!
//! Logs every request with method, path, response status and the
//! session user, if any. Runs inside `load_session` so `SessionContext`
//! is set, and outside the login guard so its redirects are logged too.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::web::types::SessionContext;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let user = req
        .extensions()
        .get::<SessionContext>()
        .and_then(|s| s.user.clone())
        .unwrap_or_else(|| "-".to_string());

    let response = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        %user,
        "Request handled"
    );
    response
}
