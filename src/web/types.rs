//! Shared types for the web layer: application context, per-request
//! session context, and cookie helpers.

use std::sync::Arc;

use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::core_state::{CoreError, CoreState};
use crate::crypto::CookieSigner;
use crate::web::views::Templates;

pub const SESSION_COOKIE: &str = "wardkeep_session";
pub const FLASH_COOKIE: &str = "wardkeep_flash";

// ═══════════════════════════════════════════════════════════
// App context
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes and middleware.
/// Wraps `CoreState` plus the compiled templates.
#[derive(Clone)]
pub struct AppContext {
    pub core: Arc<CoreState>,
    pub templates: Arc<Templates>,
}

impl AppContext {
    pub fn new(core: Arc<CoreState>) -> Result<Self, tera::Error> {
        Ok(Self {
            core,
            templates: Arc::new(Templates::load()?),
        })
    }
}

// ═══════════════════════════════════════════════════════════
// Session context
// ═══════════════════════════════════════════════════════════

/// What the incoming cookies say about the browser, injected into
/// request extensions by the session middleware.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Raw token of a live session.
    pub token: Option<String>,
    /// Username bound to that session.
    pub user: Option<String>,
    /// Flash messages queued by an earlier response and not yet shown.
    pub flashes: Vec<String>,
}

impl SessionContext {
    /// Resolve the session and flash cookies. Cookies with a bad
    /// signature, and tokens with no live session, read as anonymous.
    pub fn from_headers(core: &CoreState, headers: &HeaderMap) -> Result<Self, CoreError> {
        let mut session = Self::default();

        if let Some(token) = read_cookie(headers, SESSION_COOKIE)
            .and_then(|signed| core.signer().verify(signed))
        {
            if let Some(user) = core.session_user(token)? {
                session.token = Some(token.to_string());
                session.user = Some(user);
            }
        }

        if let Some(raw) = read_cookie(headers, FLASH_COOKIE) {
            session.flashes = decode_flashes(core.signer(), raw);
        }

        Ok(session)
    }

    pub fn current_user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

/// Logged-in staff member, injected by the `require_user` middleware.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub username: String,
    pub token: String,
}

// ═══════════════════════════════════════════════════════════
// Cookies
// ═══════════════════════════════════════════════════════════

/// Value of the first cookie called `name` across all `Cookie` headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// `Set-Cookie` value for a session-lifetime cookie.
pub fn set_cookie(name: &str, value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax")).ok()
}

/// `Set-Cookie` value that deletes the cookie.
pub fn clear_cookie(name: &str) -> HeaderValue {
    match HeaderValue::from_str(&format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")) {
        Ok(value) => value,
        Err(_) => HeaderValue::from_static("invalid=; Max-Age=0"),
    }
}

/// Signed cookie value carrying `messages`.
pub fn encode_flashes(signer: &CookieSigner, messages: &[String]) -> Option<String> {
    let json = serde_json::to_vec(messages).ok()?;
    Some(signer.sign(&URL_SAFE_NO_PAD.encode(json)))
}

/// Messages from a flash cookie; anything unsigned or malformed is dropped.
pub fn decode_flashes(signer: &CookieSigner, raw: &str) -> Vec<String> {
    signer
        .verify(raw)
        .and_then(|payload| URL_SAFE_NO_PAD.decode(payload).ok())
        .and_then(|json| serde_json::from_slice(&json).ok())
        .unwrap_or_default()
}
