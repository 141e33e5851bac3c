//! Registration, login, profile and logout.
//!
//! Failed registration and login redirect back to their form with a
//! flash message. Success starts a fresh session and redirects to the
//! profile page, which forwards to the overview.

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::{Extension, Form};
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::credentials::{self, RegisterOutcome};
use crate::db;
use crate::web::endpoints::blocking;
use crate::web::error::WebError;
use crate::web::types::{AppContext, SessionContext};
use crate::web::views::{Page, Redirect};

pub const MISSING_CREDENTIALS: &str = "Username and password are required";
pub const USERNAME_TAKEN: &str = "Username already exists";
pub const REGISTERED: &str = "Registration Successful!";
pub const BAD_CREDENTIALS: &str = "Incorrect Username and/or Password";
pub const LOGGED_OUT: &str = "You have been logged out.";

/// Username/password form shared by registration and login.
#[derive(Deserialize)]
pub struct CredentialsForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CredentialsForm {
    /// Both fields, provided neither is blank. The password comes back
    /// wrapped so it is wiped once hashed.
    fn take_filled(&mut self) -> Option<(String, Zeroizing<String>)> {
        let username = self.username.take().filter(|u| !u.trim().is_empty())?;
        let password = Zeroizing::new(self.password.take()?);
        if password.is_empty() {
            return None;
        }
        Some((username, password))
    }
}

/// `GET /register`
pub async fn register_form(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Response, WebError> {
    Page::new("register.html", &session).render(&ctx.templates)
}

/// `POST /register`: create the account and log it in.
pub async fn register(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Result<Response, WebError> {
    let Form(mut form) = form?;
    let signer = ctx.core.signer();
    let Some((username, password)) = form.take_filled() else {
        return Ok(Redirect::to("/register", &session)
            .flash(MISSING_CREDENTIALS)
            .finish(signer));
    };

    let outcome = blocking(&ctx.core, move |core| {
        let conn = core.open_db()?;
        Ok(credentials::register(&conn, core.hasher(), &username, &password)?)
    })
    .await?;

    match outcome {
        RegisterOutcome::Registered(user) => {
            sign_in(&ctx, &session, &user.username, REGISTERED.to_string())
        }
        RegisterOutcome::AlreadyExists => Ok(Redirect::to("/register", &session)
            .flash(USERNAME_TAKEN)
            .finish(signer)),
    }
}

/// `GET /login`: the landing page holds the login form.
pub async fn login_form(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Response, WebError> {
    Page::new("landing.html", &session).render(&ctx.templates)
}

/// `POST /login`
pub async fn login(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
    form: Result<Form<CredentialsForm>, FormRejection>,
) -> Result<Response, WebError> {
    let Form(mut form) = form?;
    let signer = ctx.core.signer();
    let Some((username, password)) = form.take_filled() else {
        return Ok(Redirect::to("/login", &session)
            .flash(MISSING_CREDENTIALS)
            .finish(signer));
    };

    let outcome = blocking(&ctx.core, move |core| {
        let conn = core.open_db()?;
        Ok(credentials::authenticate(&conn, core.hasher(), &username, &password)?)
    })
    .await?;

    match outcome.user() {
        Some(user) => {
            let message = format!("Logged in as: {}", user.username);
            sign_in(&ctx, &session, &user.username, message)
        }
        None => Ok(Redirect::to("/login", &session)
            .flash(BAD_CREDENTIALS)
            .finish(signer)),
    }
}

/// `GET|POST /profile/:username`: forwards a live session to the
/// overview. A session whose account no longer exists is ended.
pub async fn profile(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
    Path(requested): Path<String>,
) -> Result<Response, WebError> {
    let signer = ctx.core.signer();
    let (Some(username), Some(token)) = (session.user.clone(), session.token.clone()) else {
        return Ok(Redirect::to("/login", &session).finish(signer));
    };
    tracing::debug!(requested, username, "Profile visit");

    let lookup = username.clone();
    let exists = blocking(&ctx.core, move |core| {
        let conn = core.open_db()?;
        Ok(db::user_exists(&conn, &lookup)?)
    })
    .await?;

    if !exists {
        tracing::warn!(username, "Session refers to a missing account");
        ctx.core.end_session(&token)?;
        return Ok(Redirect::to("/login", &session).end_session().finish(signer));
    }
    Ok(Redirect::to("/overview", &session).finish(signer))
}

/// `GET /logout`: end any session and show the landing page.
pub async fn logout(
    State(ctx): State<AppContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Response, WebError> {
    if let Some(token) = &session.token {
        ctx.core.end_session(token)?;
        tracing::info!(user = session.current_user(), "Logged out");
    }
    Page::new("landing.html", &session)
        .signed_out()
        .message(LOGGED_OUT)
        .render(&ctx.templates)
}

/// Replace whatever session the browser had with a new one for
/// `username` and send it to its profile page.
fn sign_in(
    ctx: &AppContext,
    session: &SessionContext,
    username: &str,
    message: String,
) -> Result<Response, WebError> {
    if let Some(old) = &session.token {
        ctx.core.end_session(old)?;
    }
    let token = ctx.core.start_session(username)?;
    tracing::info!(username, "Session started");

    let signer = ctx.core.signer();
    Ok(Redirect::to(profile_path(username), session)
        .flash(message)
        .start_session(signer, &token)
        .finish(signer))
}

/// `/profile/<username>` with the username percent-encoded as one path
/// segment.
fn profile_path(username: &str) -> String {
    let mut path = String::from("/profile/");
    for byte in username.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            path.push(char::from(byte));
        } else {
            path.push_str(&format!("%{byte:02X}"));
        }
    }
    path
}
