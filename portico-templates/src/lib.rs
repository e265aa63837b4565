//! Layered page templates for Portico.
//!
//! Pages live in `<root>/includes/`, shared fragments in `<root>/layouts/`.
//! Every page renders through the `base` layout, which pulls the page body in
//! with `{{> content}}`.
//!
//! ```no_run
//! use portico_templates::{TemplateConfig, TemplateEngine};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = TemplateEngine::new(TemplateConfig::new("ui"))?;
//! let html = engine.render("login", &json!({"site_name": "Acme"}))?;
//!
//! // after editing files on disk
//! engine.reload()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;

pub use config::TemplateConfig;
pub use engine::{CONTENT_PARTIAL, TemplateEngine, TemplateSet};
pub use error::{Result, TemplateError};
