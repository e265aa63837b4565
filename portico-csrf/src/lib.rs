//! Anti-forgery protection for Portico.
//!
//! Safe requests receive a signed, session-bound token in a cookie and on the
//! request context; state-changing requests must echo it back in a header or
//! form field.
//!
//! ```no_run
//! use portico_csrf::*;
//!
//! let config = CsrfConfig::new(CsrfConfig::generate_secret()).unwrap();
//! let csrf = CsrfMiddleware::new(config);
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod token;

pub use config::{CsrfConfig, MIN_SECRET_LEN, SameSite};
pub use error::{CsrfError, Result};
pub use middleware::{CsrfMiddleware, FailureHandler};
pub use token::{ANONYMOUS, CsrfToken};
