// HTTP server

use crate::logging::{error, info, warn};
use crate::{HttpRequest, HttpResponse, Router};
use futures_util::FutureExt;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode, body::Incoming as IncomingBody};
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Serves a [`Router`] over HTTP/1.1, one task per connection.
#[derive(Clone)]
pub struct Application {
    router: Arc<Router>,
}

impl Application {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Bind `addr` and serve until the process exits
    pub async fn listen(self, addr: SocketAddr) -> Result<(), crate::Error> {
        self.listen_until(addr, std::future::pending()).await
    }

    /// Bind `addr` and serve until `shutdown` resolves.
    ///
    /// Connections already accepted are left to finish on their own tasks.
    pub async fn listen_until<F>(self, addr: SocketAddr, shutdown: F) -> Result<(), crate::Error>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(address = %addr, "server listening");

        tokio::pin!(shutdown);

        loop {
            let (stream, remote) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = &mut shutdown => {
                    info!("shutting down listener");
                    return Ok(());
                }
            };

            let io = TokioIo::new(stream);
            let app = self.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<IncomingBody>| {
                    let app = app.clone();
                    async move { app.serve(req, remote).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(error = %err, remote = %remote, "error serving connection");
                }
            });
        }
    }

    /// Route one request, containing any fault that escapes the middleware
    /// chain. Always produces exactly one response.
    pub async fn handle(&self, request: HttpRequest) -> HttpResponse {
        match AssertUnwindSafe(self.router.route(request))
            .catch_unwind()
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                error!(error = %err, "request failed outside the failure dispatcher");
                HttpResponse::text(err.status_code(), err.http_status().reason())
            }
            Err(_) => {
                error!("panic escaped the middleware chain");
                HttpResponse::text(500, "Internal Server Error")
            }
        }
    }

    async fn serve(
        &self,
        req: Request<IncomingBody>,
        remote: SocketAddr,
    ) -> Result<Response<Full<bytes::Bytes>>, hyper::Error> {
        let method = req.method().to_string();
        let path = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());

        let mut request = HttpRequest::new(method, path);
        request.remote_addr = Some(remote.to_string());

        for (name, value) in req.headers() {
            if let Ok(value_str) = value.to_str() {
                request
                    .headers
                    .insert(name.as_str().to_ascii_lowercase(), value_str.to_string());
            }
        }

        let body_bytes = req.collect().await?.to_bytes();
        request.body = body_bytes.to_vec();

        let response = self.handle(request).await;
        Ok(into_hyper_response(response))
    }
}

fn into_hyper_response(response: HttpResponse) -> Response<Full<bytes::Bytes>> {
    let mut builder = Response::builder().status(response.status);

    for (key, value) in &response.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    for cookie in &response.cookies {
        builder = builder.header(hyper::header::SET_COOKIE, cookie.as_str());
    }

    match builder.body(Full::new(bytes::Bytes::from(response.body))) {
        Ok(resp) => resp,
        Err(err) => {
            error!(error = %err, "invalid response head");
            let mut resp = Response::new(Full::new(bytes::Bytes::from_static(
                b"Internal Server Error",
            )));
            *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            resp
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler;

    #[tokio::test]
    async fn test_outer_boundary_contains_panic() {
        let mut router = Router::new();
        router.get(
            "/boom",
            handler(|_req| async {
                if true {
                    panic!("kaboom");
                }
                Ok(HttpResponse::ok())
            }),
        );
        router.get("/", handler(|_req| async { Ok(HttpResponse::ok()) }));
        let app = Application::new(router);

        let resp = app.handle(HttpRequest::new("GET", "/boom")).await;
        assert_eq!(resp.status, 500);

        let resp = app.handle(HttpRequest::new("GET", "/")).await;
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn test_unrouted_error_becomes_plain_response() {
        let app = Application::new(Router::new());
        let resp = app.handle(HttpRequest::new("GET", "/missing")).await;
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body_str(), "Not Found");
    }

    #[test]
    fn test_set_cookie_lines_preserved() {
        let resp = into_hyper_response(
            HttpResponse::ok()
                .with_cookie("a=1".to_string())
                .with_cookie("b=2".to_string()),
        );
        let cookies: Vec<_> = resp
            .headers()
            .get_all(hyper::header::SET_COOKIE)
            .iter()
            .collect();
        assert_eq!(cookies.len(), 2);
    }
}
