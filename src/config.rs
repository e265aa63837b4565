// Frontend configuration loaded from PORTICO_* environment variables

use portico_core::logging::{LogConfig, LogFormat, LogLevel};
use portico_csrf::CsrfConfig;
use portico_session::MIN_KEY_LEN;
use portico_templates::TemplateConfig;
use rand::RngCore;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Length of a freshly generated cookie signing key
pub const COOKIE_KEY_LEN: usize = 64;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration key not found: {0}")]
    KeyNotFound(String),

    #[error("Failed to parse {key}: {message}")]
    ParseError { key: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvError(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl From<ConfigError> for portico_core::Error {
    fn from(err: ConfigError) -> Self {
        portico_core::Error::Config(err.to_string())
    }
}

/// Environment variable loader.
///
/// Reads `{prefix}_{KEY}` from the process environment, or from a fixed map
/// when built with [`EnvLoader::from_map`].
pub struct EnvLoader {
    prefix: String,
    vars: Option<HashMap<String, String>>,
}

impl EnvLoader {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            vars: None,
        }
    }

    /// Loader over `vars` instead of the process environment
    pub fn from_map(prefix: impl Into<String>, vars: HashMap<String, String>) -> Self {
        Self {
            prefix: prefix.into(),
            vars: Some(vars),
        }
    }

    /// Load a specific variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = format!("{}_{}", self.prefix, key.to_uppercase());

        match &self.vars {
            Some(vars) => vars
                .get(&full_key)
                .cloned()
                .ok_or(ConfigError::KeyNotFound(full_key)),
            None => env::var(&full_key).map_err(ConfigError::EnvError),
        }
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Load a boolean; `1`, `true`, `yes` and `on` are true
    pub fn load_bool(&self, key: &str, default: bool) -> bool {
        match self.load_var(key) {
            Ok(value) => matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ),
            Err(_) => default,
        }
    }
}

/// Runtime settings for the frontend binary.
#[derive(Debug, Clone)]
pub struct FrontendConfig {
    /// Listen address
    pub http: SocketAddr,

    /// Shown in page titles
    pub site_name: String,

    /// Anti-forgery signing key; `None` disables the check
    pub csrf_key: Option<Vec<u8>>,

    pub csrf_cookie_name: String,

    pub csrf_field_name: String,

    pub auth_cookie_name: String,

    /// Holds the auth cookie signing key, created on first start
    pub cookie_key_file: PathBuf,

    /// Holds `layouts/`, `includes/` and `static/`
    pub ui_dir: PathBuf,

    pub strict_templates: bool,

    pub debug: bool,

    pub log_format: LogFormat,
}

impl FrontendConfig {
    /// Load `.env` if present, then the `PORTICO_*` variables
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_loader(&EnvLoader::new("PORTICO"))
    }

    pub fn from_loader(loader: &EnvLoader) -> Result<Self> {
        let http_value = loader.load_var_or("HTTP", "127.0.0.1:9000");
        let http = http_value
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError {
                key: "PORTICO_HTTP".to_string(),
                message: e.to_string(),
            })?;

        let csrf_key = match loader.load_var_or("CSRF_KEY", "") {
            key if key.is_empty() => None,
            key if key.len() < portico_csrf::MIN_SECRET_LEN => {
                return Err(ConfigError::ValidationError(format!(
                    "PORTICO_CSRF_KEY must be at least {} bytes",
                    portico_csrf::MIN_SECRET_LEN
                )));
            }
            key => Some(key.into_bytes()),
        };

        let format_name = loader.load_var_or("LOG_FORMAT", "json");
        let log_format = LogFormat::parse(&format_name).ok_or_else(|| ConfigError::ParseError {
            key: "PORTICO_LOG_FORMAT".to_string(),
            message: format!("unknown format {format_name:?}"),
        })?;

        Ok(Self {
            http,
            site_name: loader.load_var_or("SITE_NAME", "Acme"),
            csrf_key,
            csrf_cookie_name: loader.load_var_or("CSRF_COOKIE_NAME", "portico_csrf"),
            csrf_field_name: loader.load_var_or("CSRF_FIELD_NAME", "portico.csrf"),
            auth_cookie_name: loader.load_var_or("AUTH_COOKIE_NAME", "portico_auth"),
            cookie_key_file: PathBuf::from(loader.load_var_or("COOKIE_KEY_FILE", "build/cookie")),
            ui_dir: PathBuf::from(loader.load_var_or("UI_DIR", "ui")),
            strict_templates: loader.load_bool("STRICT_TEMPLATES", false),
            debug: loader.load_bool("DEBUG", false),
            log_format,
        })
    }

    pub fn templates(&self) -> TemplateConfig {
        TemplateConfig::new(&self.ui_dir).with_strict_mode(self.strict_templates)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.ui_dir.join("static")
    }

    /// Anti-forgery settings, or `None` when no key is configured
    pub fn csrf(&self) -> Result<Option<CsrfConfig>> {
        let Some(key) = &self.csrf_key else {
            return Ok(None);
        };

        let config = CsrfConfig::new(key.clone())
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?
            .with_cookie_name(self.csrf_cookie_name.as_str())
            .with_field_name(self.csrf_field_name.as_str());
        Ok(Some(config))
    }

    pub fn log_config(&self) -> LogConfig {
        let level = if self.debug {
            LogLevel::Debug
        } else {
            LogLevel::Info
        };
        LogConfig::new().level(level).format(self.log_format)
    }
}

/// Read the cookie signing key at `path`, creating a random one if the file
/// does not exist.
pub fn load_or_create_key(path: &Path) -> Result<Vec<u8>> {
    if path.exists() {
        let key = fs::read(path)?;
        if key.len() < MIN_KEY_LEN {
            return Err(ConfigError::ValidationError(format!(
                "cookie key {} is {} bytes, need at least {}",
                path.display(),
                key.len(),
                MIN_KEY_LEN
            )));
        }
        return Ok(key);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut key = vec![0u8; COOKIE_KEY_LEN];
    rand::thread_rng().fill_bytes(&mut key);

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(&key)?;

    tracing::info!(path = %path.display(), "created cookie signing key");
    Ok(key)
}
