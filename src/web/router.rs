//! Web router.
//!
//! Middleware stack (outermost → innermost):
//! Extension(AppContext) → load_session → log_access → [require_user] → handler
//!
//! The staff-only routes carry `require_user`; the public ones do not.

use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::{Extension, Router};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::web::endpoints::{auth, home, overview, patients};
use crate::web::middleware::{audit, session};
use crate::web::types::AppContext;

/// Build the site router.
///
/// Middleware uses `Extension<AppContext>` (outermost layer).
/// Handlers use `State<AppContext>` (provided via `with_state`).
pub fn web_router(ctx: AppContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/patients", get(patients::list))
        .route("/overview", get(overview::show))
        .route("/profile/:username", get(auth::profile).post(auth::profile))
        .route("/add_patient", get(patients::add_form).post(patients::add))
        .route("/edit_patient/:id", get(patients::edit_form).post(patients::edit))
        .route("/delete_patient/:id", get(patients::delete))
        .with_state(ctx.clone())
        .layer(from_fn(session::require_user))
        .layer(from_fn(audit::log_access))
        .layer(from_fn(session::load_session))
        .layer(Extension(ctx.clone()));

    let public = Router::new()
        .route("/", get(home::landing))
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .with_state(ctx.clone())
        .layer(from_fn(audit::log_access))
        .layer(from_fn(session::load_session))
        .layer(Extension(ctx));

    Router::new()
        .merge(protected)
        .merge(public)
        .fallback(home::not_found)
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::core_state::CoreState;
    use crate::db;
    use crate::models::{Criticality, PatientFilter};
    use crate::web::types::SESSION_COOKIE;

    fn test_context() -> (AppContext, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            database_dir: tmp.path().to_path_buf(),
            database_name: "ward".into(),
            secret_key: Some("router-test-secret".into()),
            host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            port: 0,
            pbkdf2_iterations: 1_000,
        };
        let core = Arc::new(CoreState::new(&config).unwrap());
        (AppContext::new(core).unwrap(), tmp)
    }

    /// Minimal cookie-keeping client over the router.
    struct Browser {
        app: Router,
        cookies: HashMap<String, String>,
    }

    impl Browser {
        fn new(ctx: &AppContext) -> Self {
            Self {
                app: web_router(ctx.clone()),
                cookies: HashMap::new(),
            }
        }

        async fn send(&mut self, mut builder: axum::http::request::Builder, body: Body) -> Response {
            if !self.cookies.is_empty() {
                let header = self
                    .cookies
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                builder = builder.header(COOKIE, header);
            }
            let response = self
                .app
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();
            self.absorb(&response);
            response
        }

        fn absorb(&mut self, response: &Response) {
            for value in response.headers().get_all(SET_COOKIE) {
                let value = value.to_str().unwrap();
                let pair = value.split(';').next().unwrap();
                let (name, cookie) = pair.split_once('=').unwrap();
                if value.contains("Max-Age=0") {
                    self.cookies.remove(name);
                } else {
                    self.cookies.insert(name.to_string(), cookie.to_string());
                }
            }
        }

        async fn get(&mut self, uri: &str) -> Response {
            self.send(Request::builder().method("GET").uri(uri), Body::empty())
                .await
        }

        async fn post(&mut self, uri: &str, form: &str) -> Response {
            let builder = Request::builder()
                .method("POST")
                .uri(uri)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
            self.send(builder, Body::from(form.to_string())).await
        }

        /// GET the page a redirect points at.
        async fn follow(&mut self, response: Response) -> Response {
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            let target = location(&response);
            self.get(&target).await
        }

        async fn register(&mut self, username: &str, password: &str) -> Response {
            self.post("/register", &format!("username={username}&password={password}"))
                .await
        }

        async fn login(&mut self, username: &str, password: &str) -> Response {
            self.post("/login", &format!("username={username}&password={password}"))
                .await
        }
    }

    fn location(response: &Response) -> String {
        response
            .headers()
            .get(LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn logged_in(ctx: &AppContext, username: &str) -> Browser {
        let mut browser = Browser::new(ctx);
        let response = browser.register(username, "pw").await;
        // Profile forwards to the overview, which shows the registration flash.
        let profile = browser.follow(response).await;
        browser.follow(profile).await;
        browser
    }

    // ── Public pages ────────────────────────────────────────

    #[tokio::test]
    async fn landing_page_has_login_form() {
        let (ctx, _tmp) = test_context();
        let mut browser = Browser::new(&ctx);

        let response = browser.get("/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "no-store");
        let html = body_text(response).await;
        assert!(html.contains(r#"action="/login""#));
    }

    #[tokio::test]
    async fn unknown_path_renders_404() {
        let (ctx, _tmp) = test_context();
        let mut browser = Browser::new(&ctx);

        let response = browser.get("/no/such/page").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("404"));
    }

    // ── Access control ──────────────────────────────────────

    #[tokio::test]
    async fn anonymous_requests_redirect_to_login() {
        let (ctx, _tmp) = test_context();
        let mut browser = Browser::new(&ctx);

        for path in [
            "/patients",
            "/overview",
            "/profile/nurse",
            "/add_patient",
            "/edit_patient/00000000-0000-0000-0000-000000000000",
            "/delete_patient/00000000-0000-0000-0000-000000000000",
        ] {
            let response = browser.get(path).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
            assert_eq!(location(&response), "/login", "{path}");
        }

        let html = body_text(browser.get("/login").await).await;
        assert!(html.contains(session::LOGIN_REQUIRED_MESSAGE));
    }

    #[tokio::test]
    async fn forged_session_cookie_is_anonymous() {
        let (ctx, _tmp) = test_context();
        let mut browser = Browser::new(&ctx);
        let token = ctx.core.start_session("nurse").unwrap();
        browser
            .cookies
            .insert(SESSION_COOKIE.to_string(), format!("{token}.forged"));

        let response = browser.get("/patients").await;
        assert_eq!(location(&response), "/login");
    }

    // ── Registration and login ──────────────────────────────

    #[tokio::test]
    async fn register_starts_session_and_lands_on_overview() {
        let (ctx, _tmp) = test_context();
        let mut browser = Browser::new(&ctx);

        let response = browser.register("Nurse", "pw").await;
        assert_eq!(location(&response), "/profile/nurse");
        assert!(browser.cookies.contains_key(SESSION_COOKIE));

        let response = browser.follow(response).await;
        assert_eq!(location(&response), "/overview");
        let html = body_text(browser.follow(response).await).await;
        assert!(html.contains("Registration Successful!"));
        assert!(html.contains("Signed in as nurse"));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let (ctx, _tmp) = test_context();
        let mut first = Browser::new(&ctx);
        first.register("nurse", "pw").await;

        let mut second = Browser::new(&ctx);
        let response = second.register("NURSE", "other").await;
        assert_eq!(location(&response), "/register");
        assert!(!second.cookies.contains_key(SESSION_COOKIE));
        let html = body_text(second.follow(response).await).await;
        assert!(html.contains(auth::USERNAME_TAKEN));

        let conn = ctx.core.open_db().unwrap();
        assert_eq!(db::count_users(&conn).unwrap(), 1);
    }

    #[tokio::test]
    async fn blank_credentials_are_rejected() {
        let (ctx, _tmp) = test_context();
        let mut browser = Browser::new(&ctx);

        let response = browser.post("/register", "username=&password=pw").await;
        assert_eq!(location(&response), "/register");
        let html = body_text(browser.follow(response).await).await;
        assert!(html.contains(auth::MISSING_CREDENTIALS));

        let response = browser.post("/login", "username=nurse").await;
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn login_failures_share_one_message() {
        let (ctx, _tmp) = test_context();
        Browser::new(&ctx).register("nurse", "pw").await;

        let mut browser = Browser::new(&ctx);
        let wrong_password = browser.login("nurse", "nope").await;
        assert_eq!(location(&wrong_password), "/login");
        let wrong_password = body_text(browser.follow(wrong_password).await).await;

        let unknown_user = browser.login("ghost", "pw").await;
        assert_eq!(location(&unknown_user), "/login");
        let unknown_user = body_text(browser.follow(unknown_user).await).await;

        assert!(wrong_password.contains("Incorrect Username and"));
        assert_eq!(wrong_password, unknown_user);
        assert!(!browser.cookies.contains_key(SESSION_COOKIE));
    }

    #[tokio::test]
    async fn login_is_case_insensitive_and_opens_session() {
        let (ctx, _tmp) = test_context();
        Browser::new(&ctx).register("nurse", "pw").await;

        let mut browser = Browser::new(&ctx);
        let response = browser.login("NURSE", "pw").await;
        assert_eq!(location(&response), "/profile/nurse");

        let response = browser.get("/patients").await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Logged in as: nurse"));
    }

    #[tokio::test]
    async fn logout_then_protected_route_redirects_to_login() {
        let (ctx, _tmp) = test_context();
        let mut browser = logged_in(&ctx, "nurse").await;
        let token_cookie = browser.cookies[SESSION_COOKIE].clone();

        let response = browser.get("/logout").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!browser.cookies.contains_key(SESSION_COOKIE));
        assert!(body_text(response).await.contains(auth::LOGGED_OUT));

        let response = browser.get("/overview").await;
        assert_eq!(location(&response), "/login");

        // Replaying the old cookie does not resurrect the session.
        browser.cookies.insert(SESSION_COOKIE.to_string(), token_cookie);
        let response = browser.get("/overview").await;
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn logout_without_session_is_harmless() {
        let (ctx, _tmp) = test_context();
        let mut browser = Browser::new(&ctx);
        let response = browser.get("/logout").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // ── Patients ────────────────────────────────────────────

    #[tokio::test]
    async fn critical_admission_moves_overview_counts() {
        let (ctx, _tmp) = test_context();
        let mut browser = logged_in(&ctx, "nurse").await;

        let before = body_text(browser.get("/overview").await).await;
        assert!(before.contains(r#"id="total-patients">0<"#));

        let response = browser
            .post(
                "/add_patient",
                "first_name=Ada&last_name=Lovelace&dob=1815-12-10&ward=a&is_critical=on&notes=",
            )
            .await;
        assert_eq!(location(&response), "/patients");
        let list = body_text(browser.follow(response).await).await;
        assert!(list.contains("Patient Successfully Added"));
        assert!(list.contains("Ada Lovelace"));

        let after = body_text(browser.get("/overview").await).await;
        assert!(after.contains(r#"id="total-patients">1<"#));
        assert!(after.contains(r#"id="ward-a">1<"#));
        assert!(after.contains(r#"id="ward-b">0<"#));
        assert!(after.contains(r#"id="total-critical">1<"#));

        let conn = ctx.core.open_db().unwrap();
        let stored = db::list_all_patients(&conn).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].added_by, "nurse");
        assert_eq!(stored[0].first_name, "ada");
    }

    #[tokio::test]
    async fn blank_checkbox_value_admits_stable_patient() {
        let (ctx, _tmp) = test_context();
        let mut browser = logged_in(&ctx, "nurse").await;

        let response = browser
            .post("/add_patient", "first_name=Ada&last_name=Lovelace&ward=a&is_critical=")
            .await;
        assert_eq!(location(&response), "/patients");

        let conn = ctx.core.open_db().unwrap();
        let stored = db::list_all_patients(&conn).unwrap();
        assert_eq!(stored[0].is_critical, Criticality::Stable);
        assert!(db::list_patients(&conn, &PatientFilter::Critical).unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_form_renders_400_page() {
        let (ctx, _tmp) = test_context();
        let mut browser = logged_in(&ctx, "nurse").await;

        let request = Request::builder().method("POST").uri("/add_patient");
        let response = browser
            .send(request, Body::from("first_name=Ada&ward=a"))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));
        let page = body_text(response).await;
        assert!(page.contains("<h1>400</h1>"));

        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .header(CONTENT_TYPE, "text/plain");
        let response = browser.send(request, Body::from("username=nurse")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let conn = ctx.core.open_db().unwrap();
        assert!(db::list_all_patients(&conn).unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_replaces_every_field() {
        let (ctx, _tmp) = test_context();
        let mut nurse = logged_in(&ctx, "nurse").await;
        nurse
            .post(
                "/add_patient",
                "first_name=Ada&last_name=Lovelace&dob=1815-12-10&ward=a&is_critical=on&notes=watch",
            )
            .await;
        let id = {
            let conn = ctx.core.open_db().unwrap();
            db::list_all_patients(&conn).unwrap()[0].id
        };

        let mut matron = logged_in(&ctx, "matron").await;
        let form = body_text(matron.get(&format!("/edit_patient/{id}")).await).await;
        assert!(form.contains(r#"value="ada""#));

        let response = matron
            .post(&format!("/edit_patient/{id}"), "first_name=Grace&ward=C")
            .await;
        assert_eq!(location(&response), "/patients");
        let list = body_text(matron.follow(response).await).await;
        assert!(list.contains("Patient Successfully Updated"));

        let conn = ctx.core.open_db().unwrap();
        let patient = db::get_patient(&conn, &id).unwrap().unwrap();
        assert_eq!(patient.first_name, "grace");
        assert_eq!(patient.last_name, "");
        assert_eq!(patient.dob, "");
        assert_eq!(patient.ward, "c");
        assert_eq!(patient.is_critical, Criticality::Stable);
        assert_eq!(patient.notes, "");
        assert_eq!(patient.added_by, "matron");
    }

    #[tokio::test]
    async fn delete_removes_patient_from_every_listing() {
        let (ctx, _tmp) = test_context();
        let mut browser = logged_in(&ctx, "nurse").await;
        browser
            .post("/add_patient", "first_name=Ada&last_name=Lovelace&ward=b&is_critical=on")
            .await;
        let id = {
            let conn = ctx.core.open_db().unwrap();
            db::list_all_patients(&conn).unwrap()[0].id
        };

        let response = browser.get(&format!("/delete_patient/{id}")).await;
        assert_eq!(location(&response), "/patients");
        let list = body_text(browser.follow(response).await).await;
        assert!(list.contains("Patient Successfully Deleted"));

        let conn = ctx.core.open_db().unwrap();
        assert!(db::list_all_patients(&conn).unwrap().is_empty());
        assert!(db::list_patients_by_ward(&conn, "b").unwrap().is_empty());
        assert!(db::list_critical_patients(&conn).unwrap().is_empty());
        assert_eq!(db::count_patients(&conn, &PatientFilter::All).unwrap(), 0);

        let again = browser.get(&format!("/delete_patient/{id}")).await;
        assert_eq!(again.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_or_malformed_ids_render_404() {
        let (ctx, _tmp) = test_context();
        let mut browser = logged_in(&ctx, "nurse").await;
        let missing = uuid::Uuid::new_v4();

        for path in [
            format!("/edit_patient/{missing}"),
            "/edit_patient/not-a-uuid".to_string(),
            "/delete_patient/not-a-uuid".to_string(),
        ] {
            let response = browser.get(&path).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        }

        let response = browser
            .post(&format!("/edit_patient/{missing}"), "first_name=x")
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn profile_of_deleted_account_ends_session() {
        let (ctx, _tmp) = test_context();
        let mut browser = logged_in(&ctx, "nurse").await;
        {
            let conn = ctx.core.open_db().unwrap();
            conn.execute("DELETE FROM users WHERE username = 'nurse'", [])
                .unwrap();
        }
        let signed = browser.cookies[SESSION_COOKIE].clone();
        let token = ctx.core.signer().verify(&signed).unwrap().to_string();
        assert!(ctx.core.session_user(&token).unwrap().is_some());

        let response = browser.get("/profile/nurse").await;
        assert_eq!(location(&response), "/login");
        assert!(!browser.cookies.contains_key(SESSION_COOKIE));
        assert_eq!(ctx.core.session_user(&token).unwrap(), None);
    }
}
