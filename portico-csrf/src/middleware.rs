use crate::{config::CsrfConfig, error::CsrfError, token::ANONYMOUS, token::CsrfToken};
use async_trait::async_trait;
use portico_core::{
    CsrfField, Error as PorticoError, HttpRequest, HttpResponse, Middleware, Next, RequestContext,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Called with the request context when a state-changing request fails the
/// anti-forgery check. The response it returns is sent as-is.
pub type FailureHandler = Arc<dyn Fn(&RequestContext, CsrfError) -> HttpResponse + Send + Sync>;

/// Double-submit anti-forgery protection.
///
/// Safe requests get a signed token cookie bound to the viewer's session and
/// the token value placed on the request context for forms to embed.
/// Anything else must send that value back in the configured header or form
/// field. Without a configuration the middleware only logs that protection is
/// off and passes requests through.
#[derive(Clone)]
pub struct CsrfMiddleware {
    config: Option<Arc<CsrfConfig>>,
    exclude_paths: Arc<Vec<String>>,
    on_failure: FailureHandler,
}

impl CsrfMiddleware {
    /// Create new CSRF middleware
    pub fn new(config: CsrfConfig) -> Self {
        Self::with_config(Some(config))
    }

    /// Middleware that performs no checks
    pub fn disabled() -> Self {
        Self::with_config(None)
    }

    fn with_config(config: Option<CsrfConfig>) -> Self {
        Self {
            config: config.map(Arc::new),
            exclude_paths: Arc::new(vec!["/assets/".to_string()]),
            on_failure: Arc::new(|_ctx: &RequestContext, _err: CsrfError| {
                HttpResponse::text(403, "Forbidden")
            }),
        }
    }

    /// Replace the response produced on a failed check
    pub fn with_failure_handler(mut self, on_failure: FailureHandler) -> Self {
        self.on_failure = on_failure;
        self
    }

    /// Path prefixes that are never checked, logged or given a cookie
    pub fn with_exclude_paths(mut self, paths: Vec<String>) -> Self {
        self.exclude_paths = Arc::new(paths);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude_paths
            .iter()
            .any(|excluded| path.starts_with(excluded.as_str()))
    }

    /// Check if request needs CSRF protection
    pub fn needs_protection(&self, request: &HttpRequest) -> bool {
        self.is_enabled() && !request.is_safe_method() && !self.is_excluded(&request.path)
    }

    /// Set-Cookie value carrying `token`
    pub fn token_cookie(config: &CsrfConfig, token: &CsrfToken) -> Result<String, CsrfError> {
        let encoded_token = token.encode(&config.secret)?;

        let mut cookie = format!(
            "{}={}; Path={}; Max-Age={}",
            config.cookie_name, encoded_token, config.cookie_path, config.token_ttl
        );

        if config.cookie_secure {
            cookie.push_str("; Secure");
        }

        if config.cookie_http_only {
            cookie.push_str("; HttpOnly");
        }

        cookie.push_str(&format!("; SameSite={}", config.cookie_same_site.as_str()));

        Ok(cookie)
    }

    /// Validate a state-changing request against the cookie token
    pub fn validate_request(
        config: &CsrfConfig,
        request: &HttpRequest,
        binding: &str,
    ) -> Result<CsrfToken, CsrfError> {
        let cookie = request
            .cookie(&config.cookie_name)
            .ok_or(CsrfError::MissingCookie)?;
        let token = CsrfToken::decode(&cookie, &config.secret)?;

        if !token.is_bound_to(binding) {
            return Err(CsrfError::SessionMismatch);
        }

        let submitted = Self::get_token_from_header(config, request)
            .or_else(|| Self::get_token_from_body(config, request))
            .ok_or(CsrfError::MissingToken)?;

        if !token.matches(&submitted) {
            return Err(CsrfError::InvalidToken);
        }

        Ok(token)
    }

    /// The cookie token, if present, valid and issued for `binding`
    fn current_token(
        config: &CsrfConfig,
        request: &HttpRequest,
        binding: &str,
    ) -> Option<CsrfToken> {
        let cookie = request.cookie(&config.cookie_name)?;
        CsrfToken::decode(&cookie, &config.secret)
            .ok()
            .filter(|token| token.is_bound_to(binding))
    }

    fn get_token_from_header(config: &CsrfConfig, request: &HttpRequest) -> Option<String> {
        request.header(&config.header_name).map(str::to_string)
    }

    fn get_token_from_body(config: &CsrfConfig, request: &HttpRequest) -> Option<String> {
        if let Ok(json) = serde_json::from_slice::<serde_json::Value>(&request.body) {
            if let Some(token) = json.get(&config.field_name) {
                return token.as_str().map(|s| s.to_string());
            }
        }

        if let Ok(form_data) = serde_urlencoded::from_bytes::<Vec<(String, String)>>(&request.body)
        {
            for (key, value) in form_data {
                if key == config.field_name {
                    return Some(value);
                }
            }
        }

        None
    }
}

#[async_trait]
impl Middleware for CsrfMiddleware {
    async fn handle(&self, mut req: HttpRequest, next: Next) -> Result<HttpResponse, PorticoError> {
        if self.is_excluded(&req.path) {
            return next(req).await;
        }

        let Some(config) = self.config.as_deref() else {
            info!(reason = "CSRF key not set.", "CSRF protection disabled");
            return next(req).await;
        };

        let binding = req
            .context
            .viewer()
            .map(|viewer| viewer.session_id.clone())
            .unwrap_or_else(|| ANONYMOUS.to_string());

        if req.is_safe_method() {
            let (token, fresh) = match Self::current_token(config, &req, &binding) {
                Some(token) => (token, false),
                None => (CsrfToken::generate(config.token_ttl, binding), true),
            };
            req.context.set_csrf(CsrfField {
                name: config.field_name.clone(),
                token: token.value.clone(),
            });

            let mut response = next(req).await?;
            if fresh {
                match Self::token_cookie(config, &token) {
                    Ok(cookie) => response.cookies.push(cookie),
                    Err(err) => warn!(error = %err, "could not issue CSRF cookie"),
                }
            }
            return Ok(response);
        }

        match Self::validate_request(config, &req, &binding) {
            Ok(token) => {
                req.context.set_csrf(CsrfField {
                    name: config.field_name.clone(),
                    token: token.value,
                });
                next(req).await
            }
            Err(err) => {
                debug!(
                    trace_id = %req.context.trace_id(),
                    path = %req.path,
                    error = %err,
                    "CSRF check failed"
                );
                Ok((self.on_failure)(&req.context, err))
            }
        }
    }
}
