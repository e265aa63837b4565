//! Request-scoped context.
//!
//! Everything middleware learns about a request travels in a
//! [`RequestContext`] owned by the [`HttpRequest`](crate::HttpRequest) itself,
//! so nothing is kept in process-wide state and nothing outlives the request.

use crate::data::RenderData;
use crate::viewer::Viewer;
use serde::Serialize;

/// Anti-forgery form field to embed in rendered forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsrfField {
    pub name: String,
    pub token: String,
}

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    trace_id: String,
    viewer: Option<Viewer>,
    data: RenderData,
    csrf: Option<CsrfField>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trace_id(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            ..Self::default()
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn set_trace_id(&mut self, trace_id: impl Into<String>) {
        self.trace_id = trace_id.into();
    }

    /// The authenticated viewer, if the session cookie resolved.
    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    pub fn set_viewer(&mut self, viewer: Viewer) {
        self.viewer = Some(viewer);
    }

    /// Data accumulated by handlers (form echoes and the like). The failure
    /// dispatcher starts from this when re-rendering a form.
    pub fn data(&self) -> &RenderData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut RenderData {
        &mut self.data
    }

    pub fn csrf(&self) -> Option<&CsrfField> {
        self.csrf.as_ref()
    }

    pub fn set_csrf(&mut self, field: CsrfField) {
        self.csrf = Some(field);
    }
}
