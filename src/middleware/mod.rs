// Frontend middleware: session authentication and panic containment

pub mod auth;
pub mod recover;

pub use auth::{AuthMiddleware, LOGIN_PATH, PUBLIC_PREFIXES, is_login_path, is_public_path};
pub use recover::{RecoverMiddleware, panic_message};
