use portico_templates::{TemplateConfig, TemplateEngine};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn site() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("layouts")).unwrap();
    fs::create_dir_all(dir.path().join("includes/account")).unwrap();

    fs::write(
        dir.path().join("layouts/base.hbs"),
        "{{> header}}{{> content}}{{> footer}}",
    )
    .unwrap();
    fs::write(dir.path().join("layouts/header.hbs"), "[{{site_name}}]").unwrap();
    fs::write(dir.path().join("layouts/footer.hbs"), "[{{trace_id}}]").unwrap();
    fs::write(
        dir.path().join("includes/login.hbs"),
        "{{#if errors.email}}<span>{{errors.email}}</span>{{/if}}<input name=\"{{csrf_field.name}}\" value=\"{{csrf_field.token}}\">",
    )
    .unwrap();
    fs::write(dir.path().join("includes/account/settings.hbs"), "settings").unwrap();

    dir
}

#[test]
fn test_page_uses_every_layout() {
    let dir = site();
    let engine = TemplateEngine::new(TemplateConfig::new(dir.path())).unwrap();

    let html = engine
        .render(
            "login",
            &json!({
                "site_name": "Acme",
                "trace_id": "t-1",
                "errors": {"email": "required"},
                "csrf_field": {"name": "portico.csrf", "token": "abc"}
            }),
        )
        .unwrap();

    assert_eq!(
        html,
        "[Acme]<span>required</span><input name=\"portico.csrf\" value=\"abc\">[t-1]"
    );
}

#[test]
fn test_nested_pages_are_named_by_path() {
    let dir = site();
    let engine = TemplateEngine::new(TemplateConfig::new(dir.path())).unwrap();

    assert!(engine.has_page("account/settings"));
    let html = engine.render("account/settings", &json!({})).unwrap();
    assert_eq!(html, "[]settings[]");
}

#[test]
fn test_concurrent_render_during_reload() {
    let dir = site();
    let engine = Arc::new(TemplateEngine::new(TemplateConfig::new(dir.path())).unwrap());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..50 {
                    let html = engine.render("login", &json!({"site_name": "Acme"})).unwrap();
                    assert!(html.starts_with("[Acme]"));
                }
            })
        })
        .collect();

    for _ in 0..10 {
        engine.reload().unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }
}
