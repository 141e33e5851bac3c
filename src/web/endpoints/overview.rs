use axum::extract::State;
use axum::response::Response;
use axum::Extension;

use crate::wards;
use crate::web::endpoints::blocking;
use crate::web::error::WebError;
use crate::web::types::{AppContext, SessionContext};
use crate::web::views::Page;

/// `GET /overview`: ward occupancy counts plus every patient.
pub async fn show(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Response, WebError> {
    let overview = blocking(&ctx.core, |core| {
        let conn = core.open_db()?;
        Ok(wards::overview(&conn)?)
    })
    .await?;

    Page::new("overview.html", &session)
        .insert("summary", &overview.summary)
        .insert("patients", &overview.patients)
        .render(&ctx.templates)
}
