// SPDX-License-Identifier: MPL-2.0

//! Drives the HTTP resolver and the runtime against a local hierarchy server
//! serving both response shapes.

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use cascadia::{
    CascadeConfig, CascadeController, CascadeRuntime, ChoiceOption, FetchError, FetchErrorKind,
    HierarchyClient, HierarchyResolver, LevelConfig,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

fn children_of(parent: &str) -> Value {
    match parent {
        "5" => json!([{"id": 10, "name": "Sub A", "slug": "sub-a"}, {"id": 11, "name": "Sub B", "slug": "sub-b"}]),
        "10" => json!([{"id": 100, "name": "Leaf X"}]),
        "1" => json!([{"id": 1, "name": "X"}]),
        _ => json!([]),
    }
}

async fn wrapped_subcategories(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let parent = q.get("category_id").map(String::as_str).unwrap_or_default();
    Json(json!({ "subcategories": children_of(parent) }))
}

async fn wrapped_sub_subcategories(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let parent = q.get("subcategory_id").map(String::as_str).unwrap_or_default();
    Json(json!({ "sub_subcategories": children_of(parent) }))
}

async fn bare_subcategories(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let parent = q.get("category_id").map(String::as_str).unwrap_or_default();
    Json(children_of(parent))
}

async fn roots() -> Json<Value> {
    Json(json!([
        {"id": 5, "name": "Shoes", "slug": "shoes", "parent": null, "is_active": true, "subcategories": []},
        {"id": 6, "name": "Bags", "slug": "bags", "parent": null, "is_active": true, "subcategories": []}
    ]))
}

/// Start the server and return its base URL.
async fn serve() -> String {
    let app = Router::new()
        .route("/store/categories/", get(roots))
        .route("/store/ajax/load-subcategories/", get(wrapped_subcategories))
        .route(
            "/store/ajax/load-sub-subcategories/",
            get(wrapped_sub_subcategories),
        )
        .route("/admin/get-subcategories/", get(bare_subcategories))
        .route("/broken/", get(|| async { "<html>not json</html>" }))
        .route(
            "/failing/",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn level(level: usize, endpoint: &str, wrapper_key: Option<&str>) -> LevelConfig {
    LevelConfig {
        level,
        name: format!("level{}", level),
        endpoint: endpoint.to_string(),
        wrapper_key: wrapper_key.map(str::to_string),
    }
}

#[tokio::test]
async fn test_both_response_shapes_normalize_identically() {
    let base_url = serve().await;
    let wrapped = HierarchyClient::new(&CascadeConfig {
        base_url: base_url.clone(),
        ..CascadeConfig::default()
    })
    .unwrap();
    let bare = HierarchyClient::new(&CascadeConfig {
        base_url,
        levels: vec![level(
            1,
            "/admin/get-subcategories/?category_id={parent}",
            None,
        )],
        ..CascadeConfig::default()
    })
    .unwrap();

    let from_wrapped = wrapped.fetch_children(1, "1").await.unwrap();
    let from_bare = bare.fetch_children(1, "1").await.unwrap();
    assert_eq!(from_wrapped, vec![ChoiceOption::new("1", "X")]);
    assert_eq!(from_wrapped, from_bare);
}

#[tokio::test]
async fn test_children_keep_server_order_and_slug() {
    let client = HierarchyClient::new(&CascadeConfig {
        base_url: serve().await,
        ..CascadeConfig::default()
    })
    .unwrap();

    let children = client.fetch_children(1, "5").await.unwrap();
    let ids: Vec<_> = children.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["10", "11"]);
    assert_eq!(children[1].slug.as_deref(), Some("sub-b"));

    let roots = client.fetch_roots().await.unwrap();
    let labels: Vec<_> = roots.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, ["Shoes", "Bags"]);
}

#[tokio::test]
async fn test_failures_are_classified() {
    let base_url = serve().await;
    let client = HierarchyClient::new(&CascadeConfig {
        base_url,
        levels: vec![
            level(1, "/failing/?parent={parent}", None),
            level(2, "/broken/?parent={parent}", None),
        ],
        ..CascadeConfig::default()
    })
    .unwrap();

    let err = client.fetch_children(1, "5").await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 500, .. }), "{err:?}");
    assert_eq!(err.kind(), FetchErrorKind::TransportFailure);

    let err = client.fetch_children(2, "5").await.unwrap_err();
    assert!(matches!(err, FetchError::ResponseFormat(_)), "{err:?}");
    assert_eq!(err.kind(), FetchErrorKind::ResponseFormatError);

    let unreachable = HierarchyClient::new(&CascadeConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        request_timeout_secs: 2,
        ..CascadeConfig::default()
    })
    .unwrap();
    let err = unreachable.fetch_children(1, "5").await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn test_runtime_against_server() {
    let config = CascadeConfig {
        base_url: serve().await,
        ..CascadeConfig::default()
    };
    let client = HierarchyClient::new(&config).unwrap();
    let roots = client.fetch_roots().await.unwrap();
    let controller = CascadeController::builder(Arc::new(client))
        .from_config(&config)
        .roots(roots)
        .build()
        .unwrap();
    let (handle, join) = CascadeRuntime::spawn(controller);

    handle.select(0, "5").await.unwrap();
    let states = handle.settled().await.unwrap();
    assert_eq!(states[1].labels(), ["---------", "Sub A", "Sub B"]);
    assert!(states[1].selected.is_none());

    handle.select(1, "10").await.unwrap();
    let states = handle.settled().await.unwrap();
    assert_eq!(states[2].labels(), ["---------", "Leaf X"]);

    handle.select(0, "").await.unwrap();
    let states = handle.settled().await.unwrap();
    assert_eq!(states[1].labels(), ["---------"]);
    assert_eq!(states[2].labels(), ["---------"]);

    drop(handle);
    let controller = join.await.unwrap();
    assert!(controller.selection_path().is_empty());
}

#[tokio::test]
async fn test_runtime_failure_leaves_chain_cleared() {
    let config = CascadeConfig {
        base_url: serve().await,
        levels: vec![
            level(1, "/store/ajax/load-subcategories/?category_id={parent}", Some("subcategories")),
            level(2, "/failing/?parent={parent}", None),
        ],
        ..CascadeConfig::default()
    };
    let client = HierarchyClient::new(&config).unwrap();
    let controller = CascadeController::builder(Arc::new(client))
        .from_config(&config)
        .roots(vec![ChoiceOption::new("5", "Shoes")])
        .build()
        .unwrap();
    let (handle, _join) = CascadeRuntime::spawn(controller);

    handle.select(0, "5").await.unwrap();
    handle.settled().await.unwrap();
    handle.select(1, "10").await.unwrap();
    let states = handle.settled().await.unwrap();

    assert!(states[2].is_reset());
    assert!(states[2].status.is_failed());
    assert_eq!(states[1].selected_id(), Some("10"));
}
