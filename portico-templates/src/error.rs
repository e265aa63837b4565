//! Error types for template loading and rendering

use thiserror::Error;

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors that can occur when loading or rendering templates
#[derive(Error, Debug)]
pub enum TemplateError {
    /// No page with this name was loaded
    #[error("no such template: {0}")]
    NotFound(String),

    #[error("Template rendering error: {0}")]
    Render(String),

    /// A layout or page failed to compile
    #[error("Template parsing error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing directories or base layout
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TemplateError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TemplateError::NotFound(_))
    }
}

impl From<handlebars::RenderError> for TemplateError {
    fn from(err: handlebars::RenderError) -> Self {
        TemplateError::Render(err.to_string())
    }
}

impl From<handlebars::TemplateError> for TemplateError {
    fn from(err: handlebars::TemplateError) -> Self {
        TemplateError::Parse(err.to_string())
    }
}

impl From<TemplateError> for portico_core::Error {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::Io(e) => portico_core::Error::Io(e),
            other => portico_core::Error::Template(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = TemplateError::NotFound("login".into());
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no such template: login");
    }

    #[test]
    fn test_into_core_error() {
        let err: portico_core::Error = TemplateError::Render("boom".into()).into();
        assert!(matches!(err, portico_core::Error::Template(_)));
        assert_eq!(err.status_code(), 500);
    }
}
