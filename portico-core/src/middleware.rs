// Middleware system for request/response processing

use crate::logging::{debug, info, trace};
use crate::{Error, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// Type alias for the next handler in the middleware chain
pub type Next = Box<
    dyn FnOnce(HttpRequest) -> Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>
        + Send,
>;

/// Type alias for handler functions
pub type HandlerFn = Arc<
    dyn Fn(HttpRequest) -> Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>
        + Send
        + Sync,
>;

/// Middleware trait for processing requests before they reach the handler
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Process the request and optionally pass to next middleware
    async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error>;
}

/// Middleware chain executor.
///
/// Middleware run in registration order, so the first one added is the
/// outermost.
#[derive(Clone)]
pub struct MiddlewareChain {
    middlewares: Arc<Vec<Arc<dyn Middleware>>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Arc::new(Vec::new()),
        }
    }

    /// Add a middleware to the chain
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        self.use_shared(Arc::new(middleware));
    }

    /// Add a middleware that is already shared elsewhere
    pub fn use_shared(&mut self, middleware: Arc<dyn Middleware>) {
        let mut mws = (*self.middlewares).clone();
        mws.push(middleware);
        self.middlewares = Arc::new(mws);
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Execute the middleware chain with a handler
    pub async fn apply(&self, req: HttpRequest, handler: HandlerFn) -> Result<HttpResponse, Error> {
        trace!(
            middleware_count = self.middlewares.len(),
            path = %req.path,
            method = %req.method,
            "Executing middleware chain"
        );
        self.execute_from(0, req, handler).await
    }

    fn execute_from(
        &self,
        index: usize,
        req: HttpRequest,
        handler: HandlerFn,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>> {
        if index >= self.middlewares.len() {
            trace!("Middleware chain complete, calling handler");
            handler(req)
        } else {
            let middleware = self.middlewares[index].clone();
            let chain = self.clone();
            let handler_clone = handler.clone();

            Box::pin(async move {
                middleware
                    .handle(
                        req,
                        Box::new(move |req| chain.execute_from(index + 1, req, handler_clone)),
                    )
                    .await
            })
        }
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Assigns a fresh trace id to every request and logs the outcome.
///
/// The id is stored in the request context and echoed back as
/// `x-request-id`. Responses with a 5xx status are logged at info level,
/// everything else at debug.
pub struct TraceMiddleware;

#[async_trait]
impl Middleware for TraceMiddleware {
    async fn handle(&self, mut req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        let start = Instant::now();
        let trace_id = uuid::Uuid::new_v4().to_string();
        req.context.set_trace_id(trace_id.clone());

        let method = req.method.clone();
        let path = req.path.clone();
        let host = req.header("host").unwrap_or_default().to_string();
        let user_agent = req.header("user-agent").unwrap_or_default().to_string();
        let forwarded_for = req.header("x-forwarded-for").unwrap_or_default().to_string();
        let referer = req.header("referer").unwrap_or_default().to_string();

        let result = next(req).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        let status = match &result {
            Ok(response) => response.status,
            Err(err) => err.status_code(),
        };

        if status >= 500 {
            info!(
                trace_id = %trace_id, method = %method, status, path = %path, host = %host,
                user_agent = %user_agent, x_forwarded_for = %forwarded_for,
                referer = %referer, duration_ms, "http request"
            );
        } else {
            debug!(
                trace_id = %trace_id, method = %method, status, path = %path, host = %host,
                user_agent = %user_agent, x_forwarded_for = %forwarded_for,
                referer = %referer, duration_ms, "http request"
            );
        }

        let mut response = result?;
        response
            .headers
            .insert("x-request-id".to_string(), trace_id);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Recorder {
        fn push(&self, entry: &str) {
            self.0.lock().unwrap().push(entry.to_string());
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct Named(&'static str, Recorder);

    #[async_trait]
    impl Middleware for Named {
        async fn handle(&self, req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
            self.1.push(&format!("enter {}", self.0));
            let resp = next(req).await;
            self.1.push(&format!("leave {}", self.0));
            resp
        }
    }

    struct ShortCircuit;

    #[async_trait]
    impl Middleware for ShortCircuit {
        async fn handle(&self, _req: HttpRequest, _next: Next) -> Result<HttpResponse, Error> {
            Ok(HttpResponse::temporary_redirect("/login"))
        }
    }

    fn ok_handler(recorder: Recorder) -> HandlerFn {
        Arc::new(move |_req| {
            let recorder = recorder.clone();
            Box::pin(async move {
                recorder.push("handler");
                Ok(HttpResponse::ok())
            })
        })
    }

    #[tokio::test]
    async fn test_chain_runs_in_registration_order() {
        let recorder = Recorder::default();
        let mut chain = MiddlewareChain::new();
        chain.use_middleware(Named("outer", recorder.clone()));
        chain.use_middleware(Named("inner", recorder.clone()));

        let resp = chain
            .apply(HttpRequest::new("GET", "/"), ok_handler(recorder.clone()))
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(
            recorder.entries(),
            vec!["enter outer", "enter inner", "handler", "leave inner", "leave outer"]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_skips_handler() {
        let recorder = Recorder::default();
        let mut chain = MiddlewareChain::new();
        chain.use_middleware(ShortCircuit);

        let resp = chain
            .apply(HttpRequest::new("GET", "/"), ok_handler(recorder.clone()))
            .await
            .unwrap();

        assert_eq!(resp.status, 307);
        assert!(recorder.entries().is_empty());
    }

    #[tokio::test]
    async fn test_trace_middleware_sets_trace_id() {
        let mut chain = MiddlewareChain::new();
        chain.use_middleware(TraceMiddleware);

        let handler: HandlerFn = Arc::new(|req: HttpRequest| {
            Box::pin(async move {
                let id = req.context.trace_id().to_string();
                Ok(HttpResponse::ok().with_body(id.into_bytes()))
            })
        });

        let resp = chain.apply(HttpRequest::new("GET", "/"), handler).await.unwrap();
        let echoed = resp.header("x-request-id").unwrap().to_string();
        assert_eq!(resp.body_str(), echoed);
        assert_eq!(echoed.len(), 36);
    }
}
