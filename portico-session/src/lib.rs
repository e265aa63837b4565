//! Server-side sessions for Portico.
//!
//! A login creates a [`Session`] in a [`SessionStore`] and hands the browser
//! a [`SignedCookie`] naming it. On later requests the [`SessionResolver`]
//! verifies the cookie, loads the session and applies the absolute
//! [`SESSION_LIFETIME`].
//!
//! ```no_run
//! use portico_session::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemorySessionStore::new());
//! let cookie = SignedCookie::new("portico_auth", vec![0u8; 64])?;
//! let resolver = SessionResolver::new(store, cookie);
//!
//! match resolver.resolve("cookie-value").await {
//!     Ok(viewer) => println!("signed in as {}", viewer.user_id),
//!     Err(err) => println!("anonymous: {err}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod cookie;
pub mod error;
pub mod memory;
pub mod resolver;
pub mod traits;

pub use cookie::{MIN_KEY_LEN, SignedCookie};
pub use error::{CookieError, ResolveError, SessionError, SessionResult};
pub use memory::MemorySessionStore;
pub use resolver::SessionResolver;
pub use traits::{SESSION_LIFETIME, Session, SessionStore, generate_session_id, session_lifetime};
