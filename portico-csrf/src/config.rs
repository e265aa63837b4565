use crate::error::{CsrfError, Result};

/// Minimum secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// CSRF protection configuration
#[derive(Debug, Clone)]
pub struct CsrfConfig {
    /// Secret key for token signing (must be at least 32 bytes)
    pub secret: Vec<u8>,

    /// Token time-to-live in seconds
    pub token_ttl: i64,

    /// Cookie name for CSRF token
    pub cookie_name: String,

    /// Header name for CSRF token
    pub header_name: String,

    /// Form field name for CSRF token
    pub field_name: String,

    pub cookie_path: String,

    /// HTTPS only
    pub cookie_secure: bool,

    pub cookie_http_only: bool,

    pub cookie_same_site: SameSite,
}

/// Cookie SameSite attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl CsrfConfig {
    /// Create a new CSRF configuration
    pub fn new(secret: Vec<u8>) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(CsrfError::Config(format!(
                "Secret key must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        Ok(Self {
            secret,
            token_ttl: 12 * 60 * 60,
            cookie_name: "portico_csrf".to_string(),
            header_name: "X-CSRF-Token".to_string(),
            field_name: "portico.csrf".to_string(),
            cookie_path: "/".to_string(),
            cookie_secure: true,
            cookie_http_only: true,
            cookie_same_site: SameSite::Strict,
        })
    }

    /// Generate a random secret key
    pub fn generate_secret() -> Vec<u8> {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        (0..MIN_SECRET_LEN).map(|_| rng.r#gen()).collect()
    }

    pub fn with_token_ttl(mut self, ttl_seconds: i64) -> Self {
        self.token_ttl = ttl_seconds;
        self
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    pub fn with_cookie_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie_same_site = same_site;
        self
    }
}
