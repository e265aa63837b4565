//! Account pages: registration, confirmation, login and logout.
//!
//! Handlers take the request by value, record what the page should echo back
//! in the request's render data, and hand every failure to
//! [`Renderer::fail`] with the page it should be shown on.

mod login;
mod register;

use crate::renderer::Renderer;
use crate::user::UserStore;
use portico_core::{HttpRequest, HttpResponse, RenderData};
use portico_session::{SessionStore, SignedCookie};
use std::sync::Arc;

pub use login::LoginForm;
pub use register::RegisterForm;

/// Alert shown when the email is unknown or the password does not match.
pub const LOGIN_FAILED: &str = "Email or password incorrect.";

pub struct AccountPages {
    renderer: Renderer,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    cookie: SignedCookie,
}

impl AccountPages {
    pub fn new(
        renderer: Renderer,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        cookie: SignedCookie,
    ) -> Self {
        Self {
            renderer,
            users,
            sessions,
            cookie,
        }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// GET /
    pub async fn home(&self, req: HttpRequest) -> HttpResponse {
        self.renderer.render(&req.context, "home", RenderData::new())
    }
}
