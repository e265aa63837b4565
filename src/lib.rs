// Portico - server-rendered web frontend
//
// Session-cookie authentication, anti-forgery checks, layered Handlebars
// pages and a single failure page, assembled on the portico-core pipeline.

pub mod account;
pub mod config;
pub mod frontend;
pub mod middleware;
pub mod renderer;
pub mod user;

pub use config::{ConfigError, EnvLoader, FrontendConfig, load_or_create_key};
pub use frontend::Frontend;
pub use renderer::{INTERNAL_PAGE, NOT_FOUND_PAGE, Renderer};

// Re-export the pipeline crates
pub use portico_core;
pub use portico_csrf;
pub use portico_session;
pub use portico_templates;
