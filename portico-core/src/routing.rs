// Routing system for HTTP requests

use crate::middleware::{HandlerFn, Middleware, MiddlewareChain};
use crate::{Error, HttpRequest, HttpResponse};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// HTTP methods
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
}

impl HttpMethod {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "HEAD" => Some(HttpMethod::HEAD),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
        }
    }
}

/// Route definition with handler
#[derive(Clone)]
pub struct Route {
    pub method: HttpMethod,
    pub path: String,
    pub handler: HandlerFn,
}

/// Wrap an async function as a [`HandlerFn`].
pub fn handler<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

/// Dispatch table for the application.
///
/// Every matched route and the not-found fallback run inside the same
/// middleware chain, so authentication, anti-forgery and panic containment
/// apply uniformly.
pub struct Router {
    pub routes: Vec<Route>,
    chain: MiddlewareChain,
    not_found: Option<HandlerFn>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            chain: MiddlewareChain::new(),
            not_found: None,
        }
    }

    /// Add a route to the router
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Register `handler` for every method in `methods`.
    ///
    /// Patterns may contain `:name` or `{name}` segments; a trailing `*`
    /// segment matches any remainder, exposed as the `*` parameter.
    pub fn handle(&mut self, methods: &[HttpMethod], path: &str, handler: HandlerFn) {
        for method in methods {
            self.add_route(Route {
                method: method.clone(),
                path: path.to_string(),
                handler: handler.clone(),
            });
        }
    }

    pub fn get(&mut self, path: &str, handler: HandlerFn) {
        self.handle(&[HttpMethod::GET], path, handler);
    }

    pub fn post(&mut self, path: &str, handler: HandlerFn) {
        self.handle(&[HttpMethod::POST], path, handler);
    }

    /// Handler used when no route matches the path and method.
    pub fn set_not_found(&mut self, handler: HandlerFn) {
        self.not_found = Some(handler);
    }

    /// Append a middleware; the first one added is the outermost.
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        self.chain.use_middleware(middleware);
    }

    pub fn use_shared(&mut self, middleware: Arc<dyn Middleware>) {
        self.chain.use_shared(middleware);
    }

    /// Find a route that matches the request and run it through the chain
    pub async fn route(&self, mut request: HttpRequest) -> Result<HttpResponse, Error> {
        let split = request
            .path
            .split_once('?')
            .map(|(path, query)| (path.to_string(), parse_query_string(query)));
        if let Some((path, query_params)) = split {
            request.path = path;
            request.query_params = query_params;
        }

        let handler = match self.find(&request.method, &request.path) {
            Some((route, params)) => {
                request.path_params = params;
                route.handler.clone()
            }
            None => self.not_found.clone().unwrap_or_else(|| {
                Arc::new(|req: HttpRequest| {
                    Box::pin(async move {
                        Err(Error::RouteNotFound(format!("{} {}", req.method, req.path)))
                    })
                })
            }),
        };

        self.chain.apply(request, handler).await
    }

    fn find(&self, method: &str, path: &str) -> Option<(&Route, HashMap<String, String>)> {
        self.routes
            .iter()
            .filter(|route| route.method.as_str() == method)
            .find_map(|route| match_path(&route.path, path).map(|params| (route, params)))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Match a route path pattern against a request path
/// Returns Some(params) if matched, None otherwise
fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let wildcard = pattern_parts.last() == Some(&"*");
    let fixed = if wildcard {
        pattern_parts.len() - 1
    } else {
        pattern_parts.len()
    };

    if wildcard {
        if path_parts.len() < fixed {
            return None;
        }
    } else if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();

    for (pattern_part, path_part) in pattern_parts[..fixed].iter().zip(path_parts.iter()) {
        let name = pattern_part.strip_prefix(':').or_else(|| {
            pattern_part
                .strip_prefix('{')
                .and_then(|p| p.strip_suffix('}'))
        });
        if let Some(param_name) = name {
            params.insert(param_name.to_string(), path_part.to_string());
        } else if pattern_part != path_part {
            return None;
        }
    }

    if wildcard {
        params.insert("*".to_string(), path_parts[fixed..].join("/"));
    }

    Some(params)
}

/// Parse a query string into a map of parameters
fn parse_query_string(query: &str) -> HashMap<String, String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}
