//! Configuration for the template engine

use std::path::{Path, PathBuf};

/// Where page templates live and how they are compiled.
///
/// `root` holds two directories: `layouts/` with the fragments shared by
/// every page (one of them the entry layout, `base` by default) and
/// `includes/` with one file per page.
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    pub root: PathBuf,

    pub layouts_dir: String,

    pub includes_dir: String,

    /// Template file extension (default: ".hbs")
    pub extension: String,

    /// Layout every page is rendered through
    pub base_layout: String,

    /// Enable strict mode (error on missing variables)
    pub strict_mode: bool,
}

impl TemplateConfig {
    /// Create a new configuration rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            layouts_dir: "layouts".to_string(),
            includes_dir: "includes".to_string(),
            extension: ".hbs".to_string(),
            base_layout: "base".to_string(),
            strict_mode: false,
        }
    }

    pub fn with_extension(mut self, ext: impl Into<String>) -> Self {
        self.extension = ext.into();
        self
    }

    pub fn with_base_layout(mut self, name: impl Into<String>) -> Self {
        self.base_layout = name.into();
        self
    }

    pub fn with_strict_mode(mut self, enable: bool) -> Self {
        self.strict_mode = enable;
        self
    }

    pub fn layouts_path(&self) -> PathBuf {
        self.root.join(&self.layouts_dir)
    }

    pub fn includes_path(&self) -> PathBuf {
        self.root.join(&self.includes_dir)
    }

    /// True when `path` carries the configured extension
    pub fn is_template(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext == self.extension.trim_start_matches('.'))
    }
}
