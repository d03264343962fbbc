//! Integration tests for plugin discovery, visibility and assets.
//!
//! Plugins are laid out on disk the way an operator would install them
//! and loaded through the same entry point the server uses.

use axum::http::{HeaderMap, HeaderValue, StatusCode};
use herakles_dashboard::plugins::assets::{resolve_asset, serve_asset};
use herakles_dashboard::plugins::load_plugins;
use herakles_dashboard::{AuthError, BackendCatalog, Role, TokenAuthenticator, TokenEntry};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn install(root: &Path, dir: &str, manifest: &str) {
    let path = root.join(dir);
    fs::create_dir_all(path.join("static")).unwrap();
    fs::write(path.join("manifest.json"), manifest).unwrap();
}

fn names(root: &Path, role: Role) -> Vec<String> {
    load_plugins(root, &BackendCatalog::builtin())
        .registry
        .list_visible(role)
        .into_iter()
        .map(|s| s.name)
        .collect()
}

#[test]
fn test_user_plugin_hidden_from_viewer() {
    let dir = tempdir().unwrap();
    install(dir.path(), "a", r#"{"name":"A","min_role":"user"}"#);
    install(dir.path(), "b", r#"{"name":"B"}"#);

    assert_eq!(names(dir.path(), Role::Viewer), vec!["B"]);
    assert_eq!(names(dir.path(), Role::User), vec!["A", "B"]);
    assert_eq!(names(dir.path(), Role::Admin), vec!["A", "B"]);
}

#[test]
fn test_visibility_is_nested_across_roles() {
    let dir = tempdir().unwrap();
    install(dir.path(), "ops", r#"{"min_role":"admin"}"#);
    install(dir.path(), "net", r#"{"min_role":"user"}"#);
    install(dir.path(), "clock", r#"{"min_role":"viewer"}"#);
    install(dir.path(), "weather", "{}");

    let viewer = names(dir.path(), Role::Viewer);
    let user = names(dir.path(), Role::User);
    let admin = names(dir.path(), Role::Admin);

    assert!(viewer.iter().all(|n| user.contains(n)));
    assert!(user.iter().all(|n| admin.contains(n)));
    assert_eq!(viewer, vec!["clock", "weather"]);
    assert_eq!(admin.len(), 4);
}

#[test]
fn test_one_bad_plugin_does_not_block_others() {
    let dir = tempdir().unwrap();
    install(dir.path(), "good", r#"{"title":"Good","scripts":["main.js"]}"#);
    install(dir.path(), "evil", r#"{"scripts":["../../etc/passwd"]}"#);
    install(dir.path(), "typo", r#"{"min_role":"superuser"}"#);

    let report = load_plugins(dir.path(), &BackendCatalog::builtin());
    assert_eq!(report.registry.len(), 1);
    assert_eq!(report.skipped.len(), 2);

    let good = report.registry.get("good").unwrap();
    assert_eq!(good.scripts, vec!["/plugins/good/static/main.js"]);
}

#[test]
fn test_summary_omits_role_floor() {
    let dir = tempdir().unwrap();
    install(
        dir.path(),
        "net",
        r#"{"title":"Network","version":"1.2.0","min_role":"user","widgets":[{"id":"rx"}]}"#,
    );

    let report = load_plugins(dir.path(), &BackendCatalog::builtin());
    let visible = report.registry.list_visible(Role::Admin);
    let json = serde_json::to_value(&visible).unwrap();

    assert_eq!(json[0]["title"], "Network");
    assert_eq!(json[0]["version"], "1.2.0");
    assert_eq!(json[0]["widgets"][0]["id"], "rx");
    assert!(json[0].get("min_role").is_none());
}

#[test]
fn test_plugin_floor_enforced_per_caller() {
    let dir = tempdir().unwrap();
    install(dir.path(), "net", r#"{"min_role":"user","module":"sysinfo"}"#);
    let report = load_plugins(dir.path(), &BackendCatalog::builtin());
    let floor = report.registry.get("net").unwrap().min_role;

    let auth = TokenAuthenticator::new(&[
        TokenEntry {
            user: "kiosk".into(),
            token: "view-token".into(),
            role: Role::Viewer,
        },
        TokenEntry {
            user: "ops".into(),
            token: "user-token".into(),
            role: Role::User,
        },
    ]);

    let mut headers = HeaderMap::new();
    assert!(matches!(
        auth.authorize(&headers, floor),
        Err(AuthError::Unauthenticated)
    ));

    headers.insert("x-api-key", HeaderValue::from_static("view-token"));
    let err = auth.authorize(&headers, floor).unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);

    headers.insert("x-api-key", HeaderValue::from_static("user-token"));
    assert_eq!(auth.authorize(&headers, floor).unwrap().name, "ops");
}

#[tokio::test]
async fn test_static_assets_stay_inside_plugin() {
    let dir = tempdir().unwrap();
    install(dir.path(), "clock", "{}");
    let static_dir = dir.path().join("clock").join("static");
    fs::write(static_dir.join("clock.js"), "console.log('tick')").unwrap();
    fs::write(dir.path().join("clock").join("manifest.json.bak"), "secret").unwrap();

    assert!(resolve_asset(&static_dir, "clock.js").await.is_some());
    assert!(resolve_asset(&static_dir, "../manifest.json.bak").await.is_none());
    assert!(resolve_asset(&static_dir, "missing.js").await.is_none());

    let ok = serve_asset(static_dir.clone(), "clock.js".into()).await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(
        ok.headers().get("content-type").unwrap(),
        "text/javascript"
    );

    let denied = serve_asset(static_dir, "../manifest.json".into()).await;
    assert_eq!(denied.status(), StatusCode::NOT_FOUND);
}
