//! Page template set and the engine that owns it

use crate::{Result, config::TemplateConfig, error::TemplateError};
use handlebars::Handlebars;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Partial name each page body is registered under.
pub const CONTENT_PARTIAL: &str = "content";

/// Compiled pages, keyed by page name.
///
/// Each page owns a registry holding every layout as a partial, the page
/// itself as [`CONTENT_PARTIAL`] and the base layout as the only template.
#[derive(Default)]
pub struct TemplateSet {
    pages: HashMap<String, Handlebars<'static>>,
    base: String,
}

impl TemplateSet {
    /// Compile every page under `config.root`
    pub fn load(config: &TemplateConfig) -> Result<Self> {
        let layouts_dir = config.layouts_path();
        let includes_dir = config.includes_path();

        for dir in [&layouts_dir, &includes_dir] {
            if !dir.is_dir() {
                return Err(TemplateError::Config(format!(
                    "Template directory not found: {:?}",
                    dir
                )));
            }
        }

        let layouts = collect(config, &layouts_dir)?;
        let Some((_, base_source)) = layouts.iter().find(|(name, _)| *name == config.base_layout)
        else {
            return Err(TemplateError::Config(format!(
                "base layout {:?} not found in {:?}",
                config.base_layout, layouts_dir
            )));
        };

        let mut pages = HashMap::new();
        for (page, source) in collect(config, &includes_dir)? {
            let mut registry = Handlebars::new();
            registry.set_strict_mode(config.strict_mode);

            for (name, layout) in &layouts {
                registry.register_partial(name, layout.as_str())?;
            }
            registry.register_partial(CONTENT_PARTIAL, source.as_str())?;
            registry.register_template_string(&config.base_layout, base_source.as_str())?;

            pages.insert(page, registry);
        }

        Ok(Self {
            pages,
            base: config.base_layout.clone(),
        })
    }

    pub fn has_page(&self, page: &str) -> bool {
        self.pages.contains_key(page)
    }

    /// Sorted page names
    pub fn pages(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pages.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Render `page` through the base layout into a string
    pub fn render<T: Serialize>(&self, page: &str, data: &T) -> Result<String> {
        let registry = self
            .pages
            .get(page)
            .ok_or_else(|| TemplateError::NotFound(page.to_string()))?;
        Ok(registry.render(&self.base, data)?)
    }
}

/// Read every template file below `dir`, named by its path relative to
/// `dir` without the extension.
fn collect(config: &TemplateConfig, dir: &Path) -> Result<Vec<(String, String)>> {
    let mut found = Vec::new();
    collect_into(config, dir, dir, &mut found)?;
    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

fn collect_into(
    config: &TemplateConfig,
    root: &Path,
    dir: &Path,
    found: &mut Vec<(String, String)>,
) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            collect_into(config, root, &path, found)?;
        } else if config.is_template(&path) {
            let name = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .with_extension("")
                .to_string_lossy()
                .replace('\\', "/");
            found.push((name, fs::read_to_string(&path)?));
        }
    }
    Ok(())
}

/// Shared, reloadable template set.
///
/// Readers clone the current `Arc` and render without holding a lock. Loading
/// and reloading are serialized and build a complete set before it replaces
/// the current one, so a failed reload leaves the previous set in service.
pub struct TemplateEngine {
    config: TemplateConfig,
    set: RwLock<Arc<TemplateSet>>,
    load_lock: Mutex<()>,
}

impl TemplateEngine {
    /// Create an engine and load the initial set
    pub fn new(config: TemplateConfig) -> Result<Self> {
        let engine = Self {
            config,
            set: RwLock::new(Arc::new(TemplateSet::default())),
            load_lock: Mutex::new(()),
        };
        engine.reload()?;
        Ok(engine)
    }

    /// Rebuild the set from disk and swap it in
    pub fn reload(&self) -> Result<()> {
        let _loading = self.load_lock.lock();

        let set = TemplateSet::load(&self.config)?;
        info!(
            root = %self.config.root.display(),
            pages = set.len(),
            "templates loaded"
        );
        *self.set.write() = Arc::new(set);
        Ok(())
    }

    /// The set currently in service
    pub fn current(&self) -> Arc<TemplateSet> {
        self.set.read().clone()
    }

    pub fn render<T: Serialize>(&self, page: &str, data: &T) -> Result<String> {
        let html = self.current().render(page, data)?;
        debug!(page, bytes = html.len(), "template rendered");
        Ok(html)
    }

    pub fn has_page(&self, page: &str) -> bool {
        self.current().has_page(page)
    }

    pub fn pages(&self) -> Vec<String> {
        self.current().pages()
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_templates() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let layouts = temp_dir.path().join("layouts");
        let includes = temp_dir.path().join("includes");
        fs::create_dir(&layouts).unwrap();
        fs::create_dir(&includes).unwrap();

        fs::write(
            layouts.join("base.hbs"),
            "<title>{{site_name}}</title>{{> nav}}<main>{{> content}}</main>",
        )
        .unwrap();
        fs::write(layouts.join("nav.hbs"), "<nav>{{#if viewer}}out{{else}}in{{/if}}</nav>").unwrap();
        fs::write(includes.join("home.hbs"), "<h1>Hello {{name}}!</h1>").unwrap();
        fs::write(includes.join("500.hbs"), "<p>error {{trace_id}}</p>").unwrap();
        fs::write(includes.join("notes.txt"), "ignored").unwrap();

        temp_dir
    }

    #[test]
    fn test_engine_creation() {
        let temp_dir = create_test_templates();
        let engine = TemplateEngine::new(TemplateConfig::new(temp_dir.path())).unwrap();

        assert_eq!(engine.pages(), vec!["500".to_string(), "home".to_string()]);
        assert!(engine.has_page("home"));
        assert!(!engine.has_page("notes"));
        assert!(!engine.has_page("nav"));
    }

    #[test]
    fn test_render_through_base_layout() {
        let temp_dir = create_test_templates();
        let engine = TemplateEngine::new(TemplateConfig::new(temp_dir.path())).unwrap();

        let html = engine
            .render("home", &json!({"site_name": "Acme", "name": "World"}))
            .unwrap();
        assert_eq!(
            html,
            "<title>Acme</title><nav>in</nav><main><h1>Hello World!</h1></main>"
        );
    }

    #[test]
    fn test_render_escapes_html() {
        let temp_dir = create_test_templates();
        let engine = TemplateEngine::new(TemplateConfig::new(temp_dir.path())).unwrap();

        let html = engine.render("home", &json!({"name": "<b>"})).unwrap();
        assert!(html.contains("Hello &lt;b&gt;!"));
    }

    #[test]
    fn test_missing_page() {
        let temp_dir = create_test_templates();
        let engine = TemplateEngine::new(TemplateConfig::new(temp_dir.path())).unwrap();

        let err = engine.render("missing", &json!({})).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_missing_directories() {
        let temp_dir = TempDir::new().unwrap();
        let result = TemplateEngine::new(TemplateConfig::new(temp_dir.path()));
        assert!(matches!(result, Err(TemplateError::Config(_))));
    }

    #[test]
    fn test_missing_base_layout() {
        let temp_dir = create_test_templates();
        fs::remove_file(temp_dir.path().join("layouts/base.hbs")).unwrap();

        let result = TemplateEngine::new(TemplateConfig::new(temp_dir.path()));
        assert!(matches!(result, Err(TemplateError::Config(_))));
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let temp_dir = create_test_templates();
        let engine = TemplateEngine::new(TemplateConfig::new(temp_dir.path())).unwrap();

        fs::write(temp_dir.path().join("includes/login.hbs"), "login").unwrap();
        assert!(!engine.has_page("login"));

        engine.reload().unwrap();
        assert!(engine.has_page("login"));
    }

    #[test]
    fn test_failed_reload_keeps_previous_set() {
        let temp_dir = create_test_templates();
        let engine = TemplateEngine::new(TemplateConfig::new(temp_dir.path())).unwrap();

        fs::write(temp_dir.path().join("includes/broken.hbs"), "{{#if}}").unwrap();
        assert!(matches!(engine.reload(), Err(TemplateError::Parse(_))));

        assert!(engine.has_page("home"));
        assert!(!engine.has_page("broken"));
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let temp_dir = create_test_templates();
        let engine = TemplateEngine::new(TemplateConfig::new(temp_dir.path())).unwrap();

        let before = engine.current();
        fs::remove_file(temp_dir.path().join("includes/home.hbs")).unwrap();
        engine.reload().unwrap();

        assert!(before.has_page("home"));
        assert!(!engine.has_page("home"));
    }

    #[test]
    fn test_strict_mode() {
        let temp_dir = create_test_templates();
        let config = TemplateConfig::new(temp_dir.path()).with_strict_mode(true);
        let engine = TemplateEngine::new(config).unwrap();

        let result = engine.render("home", &json!({"site_name": "Acme"}));
        assert!(matches!(result, Err(TemplateError::Render(_))));
    }
}
