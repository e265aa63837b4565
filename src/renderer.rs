//! Page rendering and the failure page.
//!
//! [`Renderer::render`] turns a page name plus the request's accumulated
//! render data into a complete HTML response. [`Renderer::fail`] is the one
//! place errors become pages: validation failures re-render the caller's
//! page with field errors and a 400, everything else shows the generic
//! `500` page with details kept in the log.

use portico_core::{
    Error, HttpResponse, RenderData, RequestContext,
    logging::{debug, error, info},
};
use portico_templates::{TemplateEngine, TemplateError};
use serde_json::Value;
use std::sync::Arc;

/// Page shown for every failure that is not a validation error
pub const INTERNAL_PAGE: &str = "500";

pub const NOT_FOUND_PAGE: &str = "404";

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

#[derive(Clone)]
pub struct Renderer {
    engine: Arc<TemplateEngine>,
    site_name: String,
}

impl Renderer {
    pub fn new(engine: Arc<TemplateEngine>, site_name: impl Into<String>) -> Self {
        Self {
            engine,
            site_name: site_name.into(),
        }
    }

    pub fn engine(&self) -> &Arc<TemplateEngine> {
        &self.engine
    }

    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    /// Reload templates from disk; the previous set stays in service on error
    pub fn reload(&self) -> Result<(), TemplateError> {
        self.engine.reload()
    }

    /// Render `page` with the context's render data overlaid by `data`.
    ///
    /// The body is rendered in full before the response is built, so a
    /// template that fails halfway never leaks a partial page.
    pub fn render(&self, ctx: &RequestContext, page: &str, data: RenderData) -> HttpResponse {
        let mut merged = ctx.data().clone();
        merged.merge(data);
        self.render_page(ctx, page, merged)
    }

    /// Render the failure page for `err`.
    ///
    /// `page` names the page a validation error is shown on (the `500` page
    /// when `None`). `fields` are logged with the error when the page
    /// renders; a `msg` entry becomes the log message.
    pub fn fail(
        &self,
        ctx: &RequestContext,
        err: &Error,
        page: Option<&str>,
        fields: &[(&str, &str)],
    ) -> HttpResponse {
        match err.validation() {
            Some(errors) => {
                let data = RenderData::new()
                    .with_form_errors(errors.invalid())
                    .with_log(err, fields);
                self.render(ctx, page.unwrap_or(INTERNAL_PAGE), data)
            }
            // Nothing the handler accumulated reaches the error page.
            None => self.render_page(
                ctx,
                INTERNAL_PAGE,
                RenderData::new().with_log(err, fields).with_code(500),
            ),
        }
    }

    fn render_page(&self, ctx: &RequestContext, page: &str, data: RenderData) -> HttpResponse {
        log_render_error(ctx, page, &data);

        let status = data.status().unwrap_or(200);
        let vars = self.template_vars(ctx, data);

        match self.engine.render(page, &vars) {
            Ok(html) => {
                debug!(trace_id = %ctx.trace_id(), page, status, "rendered template");
                HttpResponse::new(status)
                    .with_header("Content-Type".to_string(), HTML_CONTENT_TYPE.to_string())
                    .with_header("Cache-Control".to_string(), "no-cache".to_string())
                    .with_body(html.into_bytes())
            }
            Err(err) if page == INTERNAL_PAGE => {
                error!(
                    trace_id = %ctx.trace_id(),
                    error = %err,
                    "cannot render the internal error page"
                );
                HttpResponse::text(500, "Internal Server Error")
            }
            Err(err) => {
                let msg = if err.is_not_found() {
                    "no such template"
                } else {
                    "executing template"
                };
                self.fail(ctx, &err.into(), None, &[("msg", msg), ("page", page)])
            }
        }
    }

    fn template_vars(&self, ctx: &RequestContext, data: RenderData) -> Value {
        let mut vars = data.into_template_vars();
        vars.insert("trace_id".to_string(), Value::from(ctx.trace_id()));
        vars.insert("site_name".to_string(), Value::from(self.site_name.as_str()));
        if let Some(viewer) = ctx.viewer() {
            if let Ok(viewer) = serde_json::to_value(viewer) {
                vars.insert("viewer".to_string(), viewer);
            }
        }
        if let Some(field) = ctx.csrf() {
            if let Ok(field) = serde_json::to_value(field) {
                vars.insert("csrf_field".to_string(), field);
            }
        }
        Value::Object(vars)
    }
}

/// Log the error attached to `data`, if any. Failures shown on the `500`
/// page are logged at info, those shown on the caller's page at debug.
fn log_render_error(ctx: &RequestContext, page: &str, data: &RenderData) {
    let Some(err) = data.log_error() else {
        return;
    };
    let msg = data
        .log_fields()
        .iter()
        .find(|(key, _)| key == "msg")
        .map(|(_, value)| value.as_str())
        .unwrap_or("request failed");
    let fields: Vec<&(String, String)> = data
        .log_fields()
        .iter()
        .filter(|(key, _)| key != "msg")
        .collect();

    if page == INTERNAL_PAGE {
        info!(trace_id = %ctx.trace_id(), error = err, fields = ?fields, "{msg}");
    } else {
        debug!(trace_id = %ctx.trace_id(), error = err, page, fields = ?fields, "{msg}");
    }
}
