//! Session-cookie authentication.
//!
//! | cookie | resolves | path      | outcome                              |
//! |--------|----------|-----------|--------------------------------------|
//! | no     |          | public    | continue without a viewer            |
//! | no     |          | protected | 307 to `/login`                      |
//! | yes    | no       | public    | failure page, cookie cleared         |
//! | yes    | no       | protected | 307 to `/login`, cookie cleared      |
//! | yes    | yes      | `/login`  | 302 to `/`                           |
//! | yes    | yes      | any other | continue with the viewer attached    |
//!
//! A session store failure is an internal error on every path.

use crate::renderer::Renderer;
use async_trait::async_trait;
use portico_core::{
    Error, HttpRequest, HttpResponse, Middleware, Next,
    logging::debug,
};
use portico_session::SessionResolver;

pub const LOGIN_PATH: &str = "/login";

/// Path prefixes reachable without a session
pub const PUBLIC_PREFIXES: &[&str] = &["/login", "/assets/", "/forgot", "/register"];

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

pub fn is_login_path(path: &str) -> bool {
    path == LOGIN_PATH || path.starts_with("/login/")
}

pub struct AuthMiddleware {
    resolver: SessionResolver,
    renderer: Renderer,
}

impl AuthMiddleware {
    pub fn new(resolver: SessionResolver, renderer: Renderer) -> Self {
        Self { resolver, renderer }
    }
}

#[async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(&self, mut req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        let public = is_public_path(&req.path);

        let Some(value) = req.cookie(self.resolver.cookie().name()) else {
            if public {
                return next(req).await;
            }
            return Ok(HttpResponse::temporary_redirect(LOGIN_PATH));
        };

        match self.resolver.resolve(&value).await {
            Ok(viewer) => {
                if is_login_path(&req.path) {
                    return Ok(HttpResponse::found("/"));
                }
                req.context.set_viewer(viewer);
                next(req).await
            }
            Err(err) if err.is_store_failure() => Ok(self.renderer.fail(
                &req.context,
                &err.into(),
                None,
                &[("msg", "looking up session"), ("path", req.path.as_str())],
            )),
            Err(err) if public => {
                let response = self.renderer.fail(
                    &req.context,
                    &err.into(),
                    None,
                    &[("msg", "resolving session"), ("path", req.path.as_str())],
                );
                Ok(response.with_cookie(self.resolver.cookie().removal_cookie()))
            }
            Err(err) => {
                debug!(
                    trace_id = %req.context.trace_id(),
                    path = %req.path,
                    reason = %err,
                    "session rejected, redirecting to login"
                );
                Ok(HttpResponse::temporary_redirect(LOGIN_PATH)
                    .with_cookie(self.resolver.cookie().removal_cookie()))
            }
        }
    }
}
