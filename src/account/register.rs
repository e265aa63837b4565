use super::AccountPages;
use crate::renderer::NOT_FOUND_PAGE;
use portico_core::{HttpRequest, HttpResponse, RenderData, logging::debug, parse_form};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Fields echoed back into the form. The password never is.
#[derive(Default, Serialize)]
struct RegisterEcho<'a> {
    username: &'a str,
    email: &'a str,
}

impl AccountPages {
    /// GET /register
    pub async fn register_form(&self, req: HttpRequest) -> HttpResponse {
        let data = RenderData::new().with("form", &RegisterEcho::default());
        self.renderer.render(&req.context, "register", data)
    }

    /// POST /register
    pub async fn register(&self, mut req: HttpRequest) -> HttpResponse {
        let form: RegisterForm = match parse_form(&req.body) {
            Ok(form) => form,
            Err(err) => {
                return self.renderer.fail(
                    &req.context,
                    &err,
                    Some("register"),
                    &[("msg", "parsing form")],
                );
            }
        };

        req.context.data_mut().set(
            "form",
            &RegisterEcho {
                username: &form.username,
                email: &form.email,
            },
        );

        match self
            .users
            .create_user(&form.username, &form.email, &form.password)
            .await
        {
            Ok(user) => {
                debug!(
                    trace_id = %req.context.trace_id(),
                    user_id = %user.id,
                    token = user.confirmation_token.as_deref().unwrap_or_default(),
                    "registered user"
                );
                HttpResponse::found("/register/done")
            }
            Err(err) => self.renderer.fail(
                &req.context,
                &err.into(),
                Some("register"),
                &[("msg", "creating user")],
            ),
        }
    }

    /// GET /register/done
    pub async fn register_done(&self, req: HttpRequest) -> HttpResponse {
        self.renderer
            .render(&req.context, "register-done", RenderData::new())
    }

    /// GET /registered/confirm/{token}
    pub async fn confirm(&self, req: HttpRequest) -> HttpResponse {
        let token = req.param("token").map(String::as_str).unwrap_or_default();
        if token.is_empty() {
            return self.renderer.render(
                &req.context,
                NOT_FOUND_PAGE,
                RenderData::new()
                    .with_code(404)
                    .with_log("missing confirmation token", &[]),
            );
        }

        match self.users.confirm_user(token).await {
            Ok(()) => self
                .renderer
                .render(&req.context, "register-confirmed", RenderData::new()),
            Err(err) => self.renderer.fail(
                &req.context,
                &err.into(),
                None,
                &[("msg", "confirm user"), ("confirmation_token", token)],
            ),
        }
    }
}
