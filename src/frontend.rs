//! Wiring: stores, templates and middleware assembled into a [`Router`].
//!
//! Middleware order, outermost first: trace/log, authentication,
//! anti-forgery, panic containment. The same chain wraps the not-found
//! handler.

use crate::account::AccountPages;
use crate::config::{FrontendConfig, load_or_create_key};
use crate::middleware::{AuthMiddleware, RecoverMiddleware};
use crate::renderer::{NOT_FOUND_PAGE, Renderer};
use crate::user::{MemoryUserStore, UserStore};
use portico_core::{
    Error, HandlerFn, HttpMethod, HttpRequest, HttpResponse, RenderData, RequestContext, Router,
    StaticAssets, TraceMiddleware, handler,
};
use portico_csrf::{CsrfConfig, CsrfError, CsrfMiddleware};
use portico_session::{MemorySessionStore, SessionResolver, SessionStore, SignedCookie};
use portico_templates::{TemplateEngine, TemplateError};
use std::future::Future;
use std::sync::Arc;

pub struct Frontend {
    renderer: Renderer,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    cookie: SignedCookie,
    csrf: Option<CsrfConfig>,
    assets: Arc<StaticAssets>,
}

impl Frontend {
    pub fn new(
        renderer: Renderer,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        cookie: SignedCookie,
        csrf: Option<CsrfConfig>,
        assets: StaticAssets,
    ) -> Self {
        Self {
            renderer,
            users,
            sessions,
            cookie,
            csrf,
            assets: Arc::new(assets),
        }
    }

    /// Build from configuration with in-memory stores
    pub fn from_config(config: &FrontendConfig) -> Result<Self, Error> {
        let engine = TemplateEngine::new(config.templates())?;
        let renderer = Renderer::new(Arc::new(engine), config.site_name.as_str());

        let key = load_or_create_key(&config.cookie_key_file)?;
        let cookie = SignedCookie::new(config.auth_cookie_name.as_str(), key)
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self::new(
            renderer,
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemorySessionStore::new()),
            cookie,
            config.csrf()?,
            StaticAssets::new(config.assets_dir()),
        ))
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Swap in a freshly loaded template set
    pub fn reload_templates(&self) -> Result<(), TemplateError> {
        self.renderer.reload()
    }

    pub fn router(&self) -> Router {
        let mut router = Router::new();

        router.use_middleware(TraceMiddleware);
        router.use_middleware(AuthMiddleware::new(
            SessionResolver::new(Arc::clone(&self.sessions), self.cookie.clone()),
            self.renderer.clone(),
        ));
        router.use_middleware(self.csrf_middleware());
        router.use_middleware(RecoverMiddleware::new(self.renderer.clone()));

        let pages = Arc::new(AccountPages::new(
            self.renderer.clone(),
            Arc::clone(&self.users),
            Arc::clone(&self.sessions),
            self.cookie.clone(),
        ));
        let both = [HttpMethod::GET, HttpMethod::POST];

        router.get("/", page(&pages, |p, req| async move { p.home(req).await }));
        router.get(
            "/login",
            page(&pages, |p, req| async move { p.login_form(req).await }),
        );
        router.post("/login", page(&pages, |p, req| async move { p.login(req).await }));
        router.handle(
            &both,
            "/logout",
            page(&pages, |p, req| async move { p.logout(req).await }),
        );
        router.get(
            "/register",
            page(&pages, |p, req| async move { p.register_form(req).await }),
        );
        router.post(
            "/register",
            page(&pages, |p, req| async move { p.register(req).await }),
        );
        router.get(
            "/register/done",
            page(&pages, |p, req| async move { p.register_done(req).await }),
        );
        router.get(
            "/registered/confirm/{token}",
            page(&pages, |p, req| async move { p.confirm(req).await }),
        );
        router.get("/assets/*", self.assets_handler());

        let renderer = self.renderer.clone();
        router.set_not_found(handler(move |req: HttpRequest| {
            let renderer = renderer.clone();
            async move { Ok(not_found(&renderer, &req)) }
        }));

        router
    }

    fn csrf_middleware(&self) -> CsrfMiddleware {
        let csrf = match &self.csrf {
            Some(config) => CsrfMiddleware::new(config.clone()),
            None => CsrfMiddleware::disabled(),
        };

        let renderer = self.renderer.clone();
        csrf.with_failure_handler(Arc::new(move |ctx: &RequestContext, err: CsrfError| {
            renderer.fail(ctx, &err.into(), None, &[("msg", "csrf check failed")])
        }))
    }

    fn assets_handler(&self) -> HandlerFn {
        let assets = Arc::clone(&self.assets);
        let renderer = self.renderer.clone();

        handler(move |req: HttpRequest| {
            let assets = Arc::clone(&assets);
            let renderer = renderer.clone();
            async move {
                let relative = req.param("*").cloned().unwrap_or_default();
                match assets.serve(&relative).await {
                    Ok(Some(response)) => Ok(response),
                    Ok(None) => Ok(not_found(&renderer, &req)),
                    Err(err) if err.is_client_error() => Ok(not_found(&renderer, &req)),
                    Err(err) => Ok(renderer.fail(
                        &req.context,
                        &err,
                        None,
                        &[("msg", "serving asset"), ("path", req.path.as_str())],
                    )),
                }
            }
        })
    }
}

fn not_found(renderer: &Renderer, req: &HttpRequest) -> HttpResponse {
    renderer.render(&req.context, NOT_FOUND_PAGE, RenderData::new().with_code(404))
}

/// Route to an [`AccountPages`] method
fn page<F, Fut>(pages: &Arc<AccountPages>, f: F) -> HandlerFn
where
    F: Fn(Arc<AccountPages>, HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + Send + 'static,
{
    let pages = Arc::clone(pages);
    handler(move |req| {
        let response = f(Arc::clone(&pages), req);
        async move { Ok(response.await) }
    })
}
