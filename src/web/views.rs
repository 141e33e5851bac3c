//! HTML rendering: embedded Tera templates plus the two response shapes
//! every handler ends in, a rendered page or a redirect.
//!
//! Flash messages ride in a signed cookie. A page render shows whatever
//! is queued and clears the cookie; a redirect that adds a message
//! rewrites the cookie with the queue plus the new message.

use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use axum::response::{Html, IntoResponse, Redirect as AxumRedirect, Response};
use serde::Serialize;
use tera::{Context, Tera};

use crate::crypto::CookieSigner;
use crate::web::error::WebError;
use crate::web::types::{clear_cookie, encode_flashes, set_cookie, SessionContext, FLASH_COOKIE, SESSION_COOKIE};

const TEMPLATES: [(&str, &str); 8] = [
    ("base.html", include_str!("../../resources/templates/base.html")),
    ("landing.html", include_str!("../../resources/templates/landing.html")),
    ("register.html", include_str!("../../resources/templates/register.html")),
    ("patients.html", include_str!("../../resources/templates/patients.html")),
    ("overview.html", include_str!("../../resources/templates/overview.html")),
    ("patient_fields.html", include_str!("../../resources/templates/patient_fields.html")),
    ("add_patient.html", include_str!("../../resources/templates/add_patient.html")),
    ("edit_patient.html", include_str!("../../resources/templates/edit_patient.html")),
];

/// Static error pages, served without the template engine so they
/// still render when templating is what failed.
pub const BAD_REQUEST_PAGE: &str = include_str!("../../resources/templates/400.html");
pub const NOT_FOUND_PAGE: &str = include_str!("../../resources/templates/404.html");
pub const SERVER_ERROR_PAGE: &str = include_str!("../../resources/templates/500.html");

/// Compiled page templates.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn load() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String, WebError> {
        self.tera
            .render(name, context)
            .map_err(|e| WebError::Internal(format!("rendering {name}: {e}")))
    }
}

// ═══════════════════════════════════════════════════════════
// Page
// ═══════════════════════════════════════════════════════════

/// A full HTML page render.
pub struct Page {
    template: &'static str,
    context: Context,
    user: Option<String>,
    messages: Vec<String>,
    consumes_flash: bool,
    cookies: Vec<HeaderValue>,
}

impl Page {
    pub fn new(template: &'static str, session: &SessionContext) -> Self {
        Self {
            template,
            context: Context::new(),
            user: session.user.clone(),
            messages: session.flashes.clone(),
            consumes_flash: !session.flashes.is_empty(),
            cookies: Vec::new(),
        }
    }

    pub fn insert<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        self.context.insert(key, value);
        self
    }

    /// Show a message on this page directly.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    /// Render as anonymous and drop the session cookie.
    pub fn signed_out(mut self) -> Self {
        self.user = None;
        self.cookies.push(clear_cookie(SESSION_COOKIE));
        self
    }

    pub fn render(mut self, templates: &Templates) -> Result<Response, WebError> {
        self.context.insert("user", &self.user);
        self.context.insert("messages", &self.messages);
        let html = templates.render(self.template, &self.context)?;

        let mut response = Html(html).into_response();
        let headers = response.headers_mut();
        if self.consumes_flash {
            headers.append(SET_COOKIE, clear_cookie(FLASH_COOKIE));
        }
        for cookie in self.cookies {
            headers.append(SET_COOKIE, cookie);
        }
        Ok(response)
    }
}

// ═══════════════════════════════════════════════════════════
// Redirect
// ═══════════════════════════════════════════════════════════

/// A See Other redirect that can queue flash messages and set cookies.
pub struct Redirect {
    location: String,
    pending: Vec<String>,
    added: Vec<String>,
    cookies: Vec<HeaderValue>,
}

impl Redirect {
    pub fn to(location: impl Into<String>, session: &SessionContext) -> Self {
        Self {
            location: location.into(),
            pending: session.flashes.clone(),
            added: Vec::new(),
            cookies: Vec::new(),
        }
    }

    pub fn flash(mut self, message: impl Into<String>) -> Self {
        self.added.push(message.into());
        self
    }

    /// Bind the browser to a freshly started session.
    pub fn start_session(mut self, signer: &CookieSigner, token: &str) -> Self {
        if let Some(cookie) = set_cookie(SESSION_COOKIE, &signer.sign(token)) {
            self.cookies.push(cookie);
        }
        self
    }

    pub fn end_session(mut self) -> Self {
        self.cookies.push(clear_cookie(SESSION_COOKIE));
        self
    }

    pub fn finish(self, signer: &CookieSigner) -> Response {
        let mut response = AxumRedirect::to(&self.location).into_response();
        let headers = response.headers_mut();

        if !self.added.is_empty() {
            let mut queue = self.pending;
            queue.extend(self.added);
            if let Some(cookie) = encode_flashes(signer, &queue)
                .and_then(|value| set_cookie(FLASH_COOKIE, &value))
            {
                headers.append(SET_COOKIE, cookie);
            }
        }
        for cookie in self.cookies {
            headers.append(SET_COOKIE, cookie);
        }
        response
    }
}
