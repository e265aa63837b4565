// HTTP request and response types

use crate::context::RequestContext;
use crate::HttpStatus;
use std::collections::HashMap;

/// HTTP request wrapper
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    /// Header names are stored lowercase.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub path_params: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    pub remote_addr: Option<String>,
    pub context: RequestContext,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            body: Vec::new(),
            path_params: HashMap::new(),
            query_params: HashMap::new(),
            remote_addr: None,
            context: RequestContext::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Get a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .or_else(|| self.headers.get(name))
            .map(String::as_str)
    }

    /// Get a cookie value from the `Cookie` header
    pub fn cookie(&self, name: &str) -> Option<String> {
        let header = self.header("cookie")?;
        header.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim().trim_matches('"').to_string())
        })
    }

    /// Get a path parameter by name
    pub fn param(&self, name: &str) -> Option<&String> {
        self.path_params.get(name)
    }

    /// Get a query parameter by name
    pub fn query(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    /// GET, HEAD, OPTIONS and TRACE do not change server state.
    pub fn is_safe_method(&self) -> bool {
        matches!(self.method.as_str(), "GET" | "HEAD" | "OPTIONS" | "TRACE")
    }
}

/// HTTP response wrapper
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    /// Each entry becomes its own `Set-Cookie` line.
    pub cookies: Vec<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            cookies: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(HttpStatus::Ok.code())
    }

    pub fn not_found() -> Self {
        Self::new(HttpStatus::NotFound.code())
    }

    pub fn internal_server_error() -> Self {
        Self::new(HttpStatus::InternalServerError.code())
    }

    /// Redirect with an explicit 3xx status
    pub fn redirect(location: &str, status: HttpStatus) -> Self {
        Self::new(status.code()).with_header("Location".to_string(), location.to_string())
    }

    /// 302 Found
    pub fn found(location: &str) -> Self {
        Self::redirect(location, HttpStatus::Found)
    }

    /// 307 Temporary Redirect
    pub fn temporary_redirect(location: &str) -> Self {
        Self::redirect(location, HttpStatus::TemporaryRedirect)
    }

    /// Plain-text response, used when nothing better can be rendered
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status)
            .with_header(
                "Content-Type".to_string(),
                "text/plain; charset=utf-8".to_string(),
            )
            .with_body(body.into().into_bytes())
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn with_cookie(mut self, cookie: String) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Get a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_parsing() {
        let req = HttpRequest::new("GET", "/")
            .with_header("Cookie", "theme=dark; portico_auth=abc.def; other=1");
        assert_eq!(req.cookie("portico_auth"), Some("abc.def".to_string()));
        assert_eq!(req.cookie("theme"), Some("dark".to_string()));
        assert_eq!(req.cookie("missing"), None);
    }

    #[test]
    fn test_cookie_without_header() {
        let req = HttpRequest::new("GET", "/");
        assert_eq!(req.cookie("portico_auth"), None);
    }

    #[test]
    fn test_header_case_insensitive() {
        let req = HttpRequest::new("GET", "/").with_header("X-CSRF-Token", "t");
        assert_eq!(req.header("x-csrf-token"), Some("t"));
        assert_eq!(req.header("X-Csrf-Token"), Some("t"));
    }

    #[test]
    fn test_safe_methods() {
        assert!(HttpRequest::new("GET", "/").is_safe_method());
        assert!(HttpRequest::new("HEAD", "/").is_safe_method());
        assert!(!HttpRequest::new("POST", "/").is_safe_method());
        assert!(!HttpRequest::new("DELETE", "/").is_safe_method());
    }

    #[test]
    fn test_redirects() {
        let resp = HttpResponse::temporary_redirect("/login");
        assert_eq!(resp.status, 307);
        assert_eq!(resp.header("location"), Some("/login"));

        let resp = HttpResponse::found("/");
        assert_eq!(resp.status, 302);
        assert_eq!(resp.header("Location"), Some("/"));
    }

    #[test]
    fn test_multiple_cookies() {
        let resp = HttpResponse::ok()
            .with_cookie("a=1".to_string())
            .with_cookie("b=2".to_string());
        assert_eq!(resp.cookies.len(), 2);
    }
}
