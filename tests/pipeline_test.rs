//! End-to-end tests of the request pipeline against the bundled `ui/` pages.

use portico::Frontend;
use portico::Renderer;
use portico::user::{MemoryUserStore, UserStore};
use portico_core::{Application, HttpRequest, HttpResponse, handler};
use portico_csrf::CsrfConfig;
use portico_session::{MemorySessionStore, SignedCookie};
use portico_templates::{TemplateConfig, TemplateEngine};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const COOKIE_KEY: &[u8] = b"0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
const CSRF_KEY: &[u8] = b"fedcba9876543210fedcba9876543210";

struct Harness {
    frontend: Frontend,
    users: Arc<MemoryUserStore>,
    sessions: Arc<MemorySessionStore>,
}

impl Harness {
    fn new(csrf: Option<CsrfConfig>) -> Self {
        Self::with_strict_templates(csrf, false)
    }

    fn with_strict_templates(csrf: Option<CsrfConfig>, strict: bool) -> Self {
        let ui = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("ui");
        let config = TemplateConfig::new(&ui).with_strict_mode(strict);
        let engine = TemplateEngine::new(config).unwrap();
        let renderer = Renderer::new(Arc::new(engine), "Acme");

        let users = Arc::new(MemoryUserStore::new());
        let sessions = Arc::new(MemorySessionStore::new());
        let cookie = SignedCookie::new("portico_auth", COOKIE_KEY.to_vec()).unwrap();

        let frontend = Frontend::new(
            renderer,
            users.clone(),
            sessions.clone(),
            cookie,
            csrf,
            portico_core::StaticAssets::new(ui.join("static")),
        );

        Self {
            frontend,
            users,
            sessions,
        }
    }

    fn app(&self) -> Application {
        Application::new(self.frontend.router())
    }

    async fn register_and_login(&self, app: &Application) -> String {
        self.users
            .create_user("ann", "ann@example.com", "correct horse")
            .await
            .unwrap();

        let resp = app
            .handle(form("/login", "email=ann%40example.com&password=correct+horse"))
            .await;
        assert_eq!(resp.status, 302);
        assert_eq!(resp.header("location"), Some("/"));
        cookie_pair(&resp, "portico_auth").expect("auth cookie")
    }
}

fn get(path: &str) -> HttpRequest {
    HttpRequest::new("GET", path)
}

fn form(path: &str, body: &str) -> HttpRequest {
    HttpRequest::new("POST", path)
        .with_header("Content-Type", "application/x-www-form-urlencoded")
        .with_body(body.as_bytes().to_vec())
}

/// `name=value` from the response's Set-Cookie lines
fn cookie_pair(resp: &HttpResponse, name: &str) -> Option<String> {
    resp.cookies
        .iter()
        .find(|cookie| cookie.starts_with(&format!("{name}=")))
        .and_then(|cookie| cookie.split(';').next())
        .map(str::to_string)
}

#[tokio::test]
async fn test_protected_page_redirects_anonymous_visitor() {
    let harness = Harness::new(None);
    let resp = harness.app().handle(get("/")).await;

    assert_eq!(resp.status, 307);
    assert_eq!(resp.header("location"), Some("/login"));
    assert!(resp.header("x-request-id").is_some());
}

#[tokio::test]
async fn test_public_pages_render_without_session() {
    let harness = Harness::new(None);
    let app = harness.app();

    for (path, heading) in [
        ("/login", "Sign in"),
        ("/register", "Create an account"),
        ("/register/done", "Check your email"),
    ] {
        let resp = app.handle(get(path)).await;
        assert_eq!(resp.status, 200, "{path}");
        assert_eq!(resp.header("content-type"), Some("text/html; charset=utf-8"));
        assert_eq!(resp.header("cache-control"), Some("no-cache"));
        assert!(resp.body_str().contains(heading), "{path}");
    }
}

#[tokio::test]
async fn test_empty_registration_reports_every_field() {
    let harness = Harness::new(None);
    let resp = harness
        .app()
        .handle(form("/register", "username=&email=&password="))
        .await;

    assert_eq!(resp.status, 400);
    let body = resp.body_str();
    assert!(body.contains("username is required"));
    assert!(body.contains("email is required"));
    assert!(body.contains("password is required"));
    assert!(harness.users.is_empty());
}

#[tokio::test]
async fn test_registration_echoes_form_but_not_password() {
    let harness = Harness::new(None);
    let resp = harness
        .app()
        .handle(form("/register", "username=ann&email=&password=s3cret-value"))
        .await;

    assert_eq!(resp.status, 400);
    let body = resp.body_str();
    assert!(body.contains("value=\"ann\""));
    assert!(!body.contains("s3cret-value"));
}

#[tokio::test]
async fn test_registration_redirects_to_done() {
    let harness = Harness::new(None);
    let resp = harness
        .app()
        .handle(form(
            "/register",
            "username=ann&email=ann%40example.com&password=pw",
        ))
        .await;

    assert_eq!(resp.status, 302);
    assert_eq!(resp.header("location"), Some("/register/done"));
    assert_eq!(harness.users.len(), 1);
}

#[tokio::test]
async fn test_confirmation_link() {
    let harness = Harness::new(None);
    let app = harness.app();
    let user = harness
        .users
        .create_user("ann", "ann@example.com", "pw")
        .await
        .unwrap();
    let token = user.confirmation_token.unwrap();

    let resp = app.handle(get(&format!("/registered/confirm/{token}"))).await;
    assert_eq!(resp.status, 200);
    assert!(resp.body_str().contains("Account confirmed"));

    let resp = app.handle(get(&format!("/registered/confirm/{token}"))).await;
    assert_eq!(resp.status, 500);
    assert!(resp.body_str().contains("Something went wrong"));
}

#[tokio::test]
async fn test_login_session_and_logout() {
    let harness = Harness::new(None);
    let app = harness.app();
    let cookie = harness.register_and_login(&app).await;
    assert_eq!(harness.sessions.len(), 1);

    let resp = app.handle(get("/").with_header("Cookie", cookie.clone())).await;
    assert_eq!(resp.status, 200);
    assert!(resp.body_str().contains("Welcome"));

    let resp = app
        .handle(get("/login").with_header("Cookie", cookie.clone()))
        .await;
    assert_eq!(resp.status, 302);
    assert_eq!(resp.header("location"), Some("/"));

    let resp = app
        .handle(form("/logout", "").with_header("Cookie", cookie.clone()))
        .await;
    assert_eq!(resp.status, 302);
    assert_eq!(resp.header("location"), Some("/login"));
    assert_eq!(cookie_pair(&resp, "portico_auth").as_deref(), Some("portico_auth="));
    assert!(harness.sessions.is_empty());

    let resp = app.handle(get("/").with_header("Cookie", cookie)).await;
    assert_eq!(resp.status, 307);
    assert_eq!(resp.header("location"), Some("/login"));
}

#[tokio::test]
async fn test_wrong_password_shows_alert() {
    let harness = Harness::new(None);
    let app = harness.app();
    harness
        .users
        .create_user("ann", "ann@example.com", "correct horse")
        .await
        .unwrap();

    for body in [
        "email=ann%40example.com&password=wrong",
        "email=nobody%40example.com&password=wrong",
    ] {
        let resp = app.handle(form("/login", body)).await;
        assert_eq!(resp.status, 400);
        assert!(resp.body_str().contains("Email or password incorrect."));
        assert!(cookie_pair(&resp, "portico_auth").is_none());
    }
}

#[tokio::test]
async fn test_login_without_email_shows_field_error() {
    let harness = Harness::new(None);
    let resp = harness
        .app()
        .handle(form("/login", "email=&password=x"))
        .await;

    assert_eq!(resp.status, 400);
    assert!(resp.body_str().contains("email is required"));
}

#[tokio::test]
async fn test_tampered_cookie_on_login_page_renders_failure() {
    let harness = Harness::new(None);
    let resp = harness
        .app()
        .handle(get("/login").with_header("Cookie", "portico_auth=forged.value"))
        .await;

    assert_eq!(resp.status, 500);
    assert!(resp.body_str().contains("Something went wrong"));
    assert_eq!(cookie_pair(&resp, "portico_auth").as_deref(), Some("portico_auth="));
}

#[tokio::test]
async fn test_not_found_page() {
    let harness = Harness::new(None);
    let app = harness.app();
    let cookie = harness.register_and_login(&app).await;

    let resp = app
        .handle(get("/no/such/page").with_header("Cookie", cookie))
        .await;
    assert_eq!(resp.status, 404);
    assert!(resp.body_str().contains("Page not found"));

    let resp = app.handle(get("/assets/missing.css")).await;
    assert_eq!(resp.status, 404);
    assert!(resp.body_str().contains("Page not found"));
}

#[tokio::test]
async fn test_static_assets() {
    let harness = Harness::new(None);
    let resp = harness.app().handle(get("/assets/site.css")).await;

    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-type"), Some("text/css; charset=utf-8"));
    assert_eq!(resp.header("cache-control"), Some("no-cache"));

    let resp = harness.app().handle(get("/assets/../Cargo.toml")).await;
    assert_eq!(resp.status, 404);
}

#[tokio::test]
async fn test_panicking_handler_yields_one_failure_page() {
    let harness = Harness::new(None);
    let mut router = harness.frontend.router();
    router.get(
        "/boom",
        handler(|_req: HttpRequest| async move {
            if true {
                panic!("handler exploded");
            }
            Ok(HttpResponse::ok())
        }),
    );
    let app = Application::new(router);
    let cookie = harness.register_and_login(&app).await;

    let resp = app.handle(get("/boom").with_header("Cookie", cookie.clone())).await;
    assert_eq!(resp.status, 500);
    let body = resp.body_str();
    assert!(body.contains("Something went wrong"));
    assert!(!body.contains("exploded"));
    assert_eq!(body.matches("<html").count(), 1);

    let resp = app.handle(get("/").with_header("Cookie", cookie)).await;
    assert_eq!(resp.status, 200);
}

#[tokio::test]
async fn test_csrf_token_required_when_enabled() {
    let config = CsrfConfig::new(CSRF_KEY.to_vec()).unwrap();
    let harness = Harness::new(Some(config));
    let app = harness.app();
    harness
        .users
        .create_user("ann", "ann@example.com", "pw")
        .await
        .unwrap();

    let page = app.handle(get("/login")).await;
    assert_eq!(page.status, 200);
    let csrf_cookie = cookie_pair(&page, "portico_csrf").expect("csrf cookie");
    let body = page.body_str();
    assert!(body.contains("name=\"portico.csrf\""));

    let resp = app
        .handle(form("/login", "email=ann%40example.com&password=pw"))
        .await;
    assert_eq!(resp.status, 500);
    assert!(cookie_pair(&resp, "portico_auth").is_none());

    let token = body
        .split("name=\"portico.csrf\" value=\"")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap()
        .to_string();
    let resp = app
        .handle(
            form(
                "/login",
                &format!("email=ann%40example.com&password=pw&portico.csrf={token}"),
            )
            .with_header("Cookie", csrf_cookie),
        )
        .await;
    assert_eq!(resp.status, 302);
    assert!(cookie_pair(&resp, "portico_auth").is_some());
}

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_csrf_disabled_accepts_post_and_logs_once_per_request() {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let harness = Harness::new(None);
    let resp = harness
        .app()
        .handle(form("/register", "username=ann&email=ann%40example.com&password=pw"))
        .await;
    assert_eq!(resp.status, 302);

    let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    assert_eq!(output.matches("CSRF protection disabled").count(), 1);
}

#[tokio::test]
async fn test_every_page_renders_with_strict_templates() {
    let harness = Harness::with_strict_templates(None, true);
    let app = harness.app();

    for (path, status, heading) in [
        ("/login", 200, "Sign in"),
        ("/register", 200, "Create an account"),
        ("/register/done", 200, "Check your email"),
        ("/registered/confirm/unknown", 500, "Something went wrong"),
    ] {
        let resp = app.handle(get(path)).await;
        assert_eq!(resp.status, status, "{path}");
        assert!(resp.body_str().contains(heading), "{path}");
    }

    let resp = app.handle(form("/register", "username=&email=&password=")).await;
    assert_eq!(resp.status, 400);
    assert!(resp.body_str().contains("username is required"));

    let resp = app.handle(form("/login", "email=&password=")).await;
    assert_eq!(resp.status, 400);
    assert!(resp.body_str().contains("Sign in"));

    let resp = app
        .handle(form("/login", "email=nobody%40example.com&password=pw"))
        .await;
    assert_eq!(resp.status, 400);
    assert!(resp.body_str().contains("Email or password incorrect."));

    let user = harness
        .users
        .create_user("ann", "ann@example.com", "correct horse")
        .await
        .unwrap();
    let token = user.confirmation_token.unwrap();
    let resp = app.handle(get(&format!("/registered/confirm/{token}"))).await;
    assert_eq!(resp.status, 200);
    assert!(resp.body_str().contains("Account confirmed"));

    let resp = app
        .handle(form("/login", "email=ann%40example.com&password=correct+horse"))
        .await;
    let cookie = cookie_pair(&resp, "portico_auth").expect("auth cookie");

    let resp = app.handle(get("/").with_header("Cookie", cookie.clone())).await;
    assert_eq!(resp.status, 200);
    assert!(resp.body_str().contains("Welcome"));

    let resp = app
        .handle(get("/no/such/page").with_header("Cookie", cookie))
        .await;
    assert_eq!(resp.status, 404);
    assert!(resp.body_str().contains("Page not found"));
}

#[tokio::test]
async fn test_strict_templates_with_csrf_field() {
    let csrf = CsrfConfig::new(CSRF_KEY.to_vec()).unwrap();
    let harness = Harness::with_strict_templates(Some(csrf), true);

    let resp = harness.app().handle(get("/login")).await;
    assert_eq!(resp.status, 200);
    assert!(resp.body_str().contains("name=\"portico.csrf\""));
}
