use super::{AccountPages, LOGIN_FAILED};
use crate::user::UserError;
use chrono::Utc;
use portico_core::{
    Error, HttpRequest, HttpResponse, RenderData, Viewer,
    logging::{debug, info},
    parse_form,
};
use portico_session::SignedCookie;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Fields echoed back into the login form.
#[derive(Default, Serialize)]
struct LoginEcho<'a> {
    email: &'a str,
}

impl AccountPages {
    /// GET /login
    pub async fn login_form(&self, req: HttpRequest) -> HttpResponse {
        let data = RenderData::new().with("form", &LoginEcho::default());
        self.renderer.render(&req.context, "login", data)
    }

    /// POST /login
    pub async fn login(&self, mut req: HttpRequest) -> HttpResponse {
        let form: LoginForm = match parse_form(&req.body) {
            Ok(form) => form,
            Err(err) => {
                return self
                    .renderer
                    .fail(&req.context, &err, Some("login"), &[("msg", "parsing form")]);
            }
        };

        req.context
            .data_mut()
            .set("form", &LoginEcho { email: &form.email });

        let user = match self.users.find_user_by_email(&form.email).await {
            Ok(user) if user.check_password(&form.password) => user,
            Ok(_) | Err(UserError::NotFound) => {
                debug!(trace_id = %req.context.trace_id(), "login rejected");
                return self.renderer.render(
                    &req.context,
                    "login",
                    RenderData::new().with_code(400).with_alert(LOGIN_FAILED),
                );
            }
            Err(err) => {
                return self.renderer.fail(
                    &req.context,
                    &err.into(),
                    Some("login"),
                    &[("msg", "finding user")],
                );
            }
        };

        let viewer = Viewer::for_user(&user.id).with_username(&user.username);
        let session = match self.sessions.create_session(&viewer).await {
            Ok(session) => session,
            Err(err) => {
                return self.renderer.fail(
                    &req.context,
                    &err.into(),
                    None,
                    &[("msg", "creating session")],
                );
            }
        };

        match self
            .cookie
            .set_cookie(&SignedCookie::session_payload(&session.id), Utc::now())
        {
            Ok(cookie) => {
                debug!(
                    trace_id = %req.context.trace_id(),
                    user_id = %user.id,
                    "logged in"
                );
                HttpResponse::found("/").with_cookie(cookie)
            }
            Err(err) => self.renderer.fail(
                &req.context,
                &Error::Internal(err.to_string()),
                None,
                &[("msg", "encoding session cookie")],
            ),
        }
    }

    /// GET|POST /logout
    pub async fn logout(&self, req: HttpRequest) -> HttpResponse {
        if let Some(viewer) = req.context.viewer() {
            if let Err(err) = self.sessions.destroy_session(viewer).await {
                info!(
                    trace_id = %req.context.trace_id(),
                    error = %err,
                    "destroying session"
                );
            }
        }

        HttpResponse::found("/login").with_cookie(self.cookie.removal_cookie())
    }
}
