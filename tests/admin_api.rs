//! Admin HTTP surface, driven in-process through `tower::ServiceExt`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use config_admin::admin::{self, BearerToken};
use config_admin::config::{Store, StoreOptions};

mod common;
use common::{settings, write_config, Settings};

const TOKEN: &str = "test-token";

fn app(dir: &TempDir, options: StoreOptions) -> (Router, Store<Settings>) {
    let path = write_config(dir, "app.toml", &settings());
    let store = Store::<Settings>::load(path, options).unwrap();
    let router = admin::router(store.clone(), Arc::new(BearerToken::new(TOKEN)));
    (router, store)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        // Extractor rejections answer in plain text.
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

#[tokio::test]
async fn test_requires_bearer_token() {
    let dir = TempDir::new().unwrap();
    let (router, _) = app(&dir, StoreOptions::new());

    let anonymous = Request::builder()
        .uri("/admin/status")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&router, anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/admin/status")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&router, wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&router, get("/admin/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["format"], "toml");
    assert_eq!(body["auto_apply"], true);
    assert_eq!(body["watching"], false);
}

#[tokio::test]
async fn test_config_page_follows_focus() {
    let dir = TempDir::new().unwrap();
    let (router, _) = app(&dir, StoreOptions::new());

    let (status, body) = send(&router, get("/admin/config?focus=Services.1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["values"]["Listener.Port"], 8080);
    assert_eq!(body["values"]["Services.1.Name"], "b");
    assert_eq!(body["form"]["focus"], "Services.1");

    let crumbs: Vec<_> = body["navigation"]["breadcrumbs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["path"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(crumbs, vec!["Services", "Services.1"]);

    let (status, _) = send(&router, get("/admin/config?focus=0.Services")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_applies_partial_form() {
    let dir = TempDir::new().unwrap();
    let (router, store) = app(&dir, StoreOptions::new());

    let (status, body) = send(&router, post("/admin/config", "Listener.Port=9000")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied"], true);
    assert_eq!(body["event"]["source"], "form_submit");
    assert_eq!(body["event"]["path"], "Listener.Port");

    let mut expected = settings();
    expected.listener.port = 9000;
    assert_eq!(store.snapshot(), expected);
}

#[tokio::test]
async fn test_field_errors_are_unprocessable() {
    let dir = TempDir::new().unwrap();
    let (router, store) = app(&dir, StoreOptions::new());

    let (status, body) = send(
        &router,
        post("/admin/config", "Listener.Port=0&Services.0.Weight=heavy"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let paths: Vec<_> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["path"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(paths, vec!["Listener.Port", "Services.0.Weight"]);
    assert_eq!(store.snapshot(), settings());
}

#[tokio::test]
async fn test_checkbox_hidden_off_input() {
    let dir = TempDir::new().unwrap();
    let (router, store) = app(&dir, StoreOptions::new());

    let (status, _) = send(&router, post("/admin/config", "Listener.TLS=off")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!store.read(|s| s.listener.tls));

    let (status, _) = send(&router, post("/admin/config", "Listener.TLS=off&Listener.TLS=on")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(store.read(|s| s.listener.tls));
}

#[tokio::test]
async fn test_preview_then_confirm() {
    let dir = TempDir::new().unwrap();
    let (router, store) = app(&dir, StoreOptions::new().auto_apply(false));

    let (status, body) = send(&router, post("/admin/config", "Name=preview")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied"], false);
    assert_eq!(body["values"]["Name"], "preview");
    assert_eq!(store.read(|s| s.name.clone()), "edge");

    let (status, body) = send(&router, post("/admin/config/confirm", "Name=preview")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied"], true);
    assert_eq!(store.read(|s| s.name.clone()), "preview");
}

#[tokio::test]
async fn test_list_item_routes() {
    let dir = TempDir::new().unwrap();
    let (router, store) = app(&dir, StoreOptions::new());

    let (status, body) = send(&router, post("/admin/config/items/add", "path=Services")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["len"], 3);

    let (status, body) = send(
        &router,
        post("/admin/config/items/remove", "path=Services&index=0"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["len"], 2);
    assert_eq!(store.read(|s| s.services[0].name.clone()), "b");

    let (status, _) = send(
        &router,
        post("/admin/config/items/remove", "path=Services&index=9"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&router, post("/admin/config/items/add", "path=Missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_requires_index() {
    let dir = TempDir::new().unwrap();
    let (router, store) = app(&dir, StoreOptions::new());

    let (status, _) = send(&router, post("/admin/config/items/remove", "path=Services")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &router,
        post("/admin/config/items/remove", "path=Services&index="),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(store.snapshot(), settings());
}

#[tokio::test]
async fn test_unindexed_list_key_is_unprocessable() {
    let dir = TempDir::new().unwrap();
    let (router, store) = app(&dir, StoreOptions::new());

    for form in ["Services.Name=x", "Services.01.Name=y", "Name.0=z"] {
        let (status, body) = send(&router, post("/admin/config", form)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", form);
        assert_eq!(body["fields"].as_array().unwrap().len(), 1, "{}", form);
    }
    assert_eq!(store.snapshot(), settings());
}

#[tokio::test]
async fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let (router, store) = app(&dir, StoreOptions::new());

    send(&router, post("/admin/config", "Name=persisted")).await;
    let (status, body) = send(&router, post("/admin/save", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved"], true);

    let on_disk: Settings = toml::from_str(&std::fs::read_to_string(store.file()).unwrap()).unwrap();
    assert_eq!(on_disk.name, "persisted");

    write_config(&dir, "app.toml", &settings());
    let (status, body) = send(&router, post("/admin/reload", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "manual");
    assert_eq!(store.snapshot(), settings());
}
