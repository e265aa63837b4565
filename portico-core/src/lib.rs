// Core library for Portico
// Request/response types, the middleware chain, routing and the HTTP server

pub mod application;
pub mod context;
pub mod data;
pub mod error;
pub mod form;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod routing;
pub mod static_assets;
pub mod status;
pub mod validation;
pub mod viewer;

// Re-export commonly used types
pub use application::*;
pub use context::*;
pub use data::*;
pub use error::*;
pub use form::*;
pub use http::*;
pub use middleware::*;
pub use routing::{HttpMethod, Route, Router, handler};
pub use static_assets::*;
pub use status::*;
pub use validation::*;
pub use viewer::*;
