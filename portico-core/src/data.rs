//! Per-request render data.
//!
//! [`RenderData`] accumulates the variables a page template sees, plus a few
//! control slots that steer rendering but are never exposed as ordinary
//! template variables: the status override, the error to log alongside the
//! render, the field-error map and the alert banner. Control slots are plain
//! struct fields, so a form field called `status` or `errors` can never clash
//! with them.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::warn;

/// Template variable names filled in by the renderer. [`RenderData::set`]
/// refuses them.
pub const RESERVED_KEYS: &[&str] = &[
    "errors",
    "alert",
    "trace_id",
    "site_name",
    "csrf_field",
    "viewer",
];

#[derive(Debug, Clone, Default)]
pub struct RenderData {
    vars: Map<String, Value>,
    status: Option<u16>,
    log_error: Option<String>,
    log_fields: Vec<(String, String)>,
    field_errors: BTreeMap<String, String>,
    alert: Option<String>,
}

impl RenderData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a template variable. Reserved names are ignored.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> &mut Self {
        if RESERVED_KEYS.contains(&key) {
            warn!(key, "refusing to overwrite reserved template variable");
            return self;
        }
        match serde_json::to_value(value) {
            Ok(value) => {
                self.vars.insert(key.to_string(), value);
            }
            Err(err) => warn!(key, error = %err, "template variable is not serializable"),
        }
        self
    }

    /// Builder form of [`RenderData::set`].
    pub fn with<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    /// Override the response status (default 200).
    pub fn with_code(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach an error and key/value pairs to be logged when the page renders.
    pub fn with_log<E: Display + ?Sized>(mut self, err: &E, fields: &[(&str, &str)]) -> Self {
        self.log_error = Some(err.to_string());
        self.log_fields
            .extend(fields.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self
    }

    /// Attach field errors. Always forces a 400 status.
    pub fn with_form_errors(mut self, errors: BTreeMap<String, String>) -> Self {
        self.field_errors = errors;
        self.status = Some(400);
        self
    }

    /// Show a banner message above the page content.
    pub fn with_alert(mut self, alert: impl Into<String>) -> Self {
        self.alert = Some(alert.into());
        self
    }

    /// Fold `other` into `self`. Variables in `other` win; control slots in
    /// `other` win when set.
    pub fn merge(&mut self, other: RenderData) {
        self.vars.extend(other.vars);
        if other.status.is_some() {
            self.status = other.status;
        }
        if other.log_error.is_some() {
            self.log_error = other.log_error;
        }
        self.log_fields.extend(other.log_fields);
        if !other.field_errors.is_empty() {
            self.field_errors = other.field_errors;
        }
        if other.alert.is_some() {
            self.alert = other.alert;
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn log_error(&self) -> Option<&str> {
        self.log_error.as_deref()
    }

    pub fn log_fields(&self) -> &[(String, String)] {
        &self.log_fields
    }

    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn vars(&self) -> &Map<String, Value> {
        &self.vars
    }

    /// The variables a template sees. `errors` is always present (possibly
    /// empty); `alert` only when one was set.
    pub fn into_template_vars(self) -> Map<String, Value> {
        let mut vars = self.vars;
        let errors: Map<String, Value> = self
            .field_errors
            .into_iter()
            .map(|(field, message)| (field, Value::String(message)))
            .collect();
        vars.insert("errors".to_string(), Value::Object(errors));
        if let Some(alert) = self.alert {
            vars.insert("alert".to_string(), Value::String(alert));
        }
        vars
    }
}
