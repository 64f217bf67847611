//! Integration tests for the membudget-web server.
//!
//! These tests start a real axum server on a random port and exercise
//! the REST and WebSocket endpoints.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use membudget::prelude::*;
use membudget_web::{WebConfig, spawn_web};
use tokio_tungstenite::tungstenite::Message;

/// Helper: spawn a test server on port 0 (random available port).
///
/// `alice` has an even 1000-token split stored; everyone else starts from
/// the defaults.
async fn spawn_test_server() -> (Arc<MemorySettingsStore>, String) {
    spawn_test_server_with(WebConfig::default().max_sessions).await
}

async fn spawn_test_server_with(max_sessions: usize) -> (Arc<MemorySettingsStore>, String) {
    let store = Arc::new(MemorySettingsStore::new());
    store.insert(
        "alice",
        UserSettings {
            max_tokens: 8000,
            min_tokens: 100,
            allocation: CategorySizes::from_array([1000; 8]),
            updated_at: None,
        },
    );

    let config = WebConfig {
        bind_addr: ([127, 0, 0, 1], 0).into(),
        max_sessions,
        ..Default::default()
    };

    let addr = spawn_web(store.clone(), PanelConfig::default(), None, config)
        .await
        .unwrap();
    (store, format!("http://{addr}"))
}

async fn post_json(url: String, body: serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap()
}

// ── REST Tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn get_settings_opens_stored_session() {
    let (_store, base) = spawn_test_server().await;

    let resp = reqwest::get(format!("{base}/api/settings/alice"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["user"], "alice");
    assert_eq!(json["origin"], "stored");
    assert_eq!(json["total"], 8000);
    assert_eq!(json["breakdown"]["recent"]["percentage"], 12.5);
    assert_eq!(json["dirty"], false);
}

#[tokio::test]
async fn unknown_user_gets_default_split() {
    let (_store, base) = spawn_test_server().await;

    let json: serde_json::Value = reqwest::get(format!("{base}/api/settings/newcomer"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["origin"], "default");
    assert_eq!(
        json["boundaries"],
        serde_json::json!([0, 800, 1600, 2400, 3200, 5200, 5600, 6800, 8000])
    );
}

#[tokio::test]
async fn move_pushes_coupled_tail_handle() {
    let (_store, base) = spawn_test_server().await;
    reqwest::get(format!("{base}/api/settings/alice"))
        .await
        .unwrap();

    let resp = post_json(
        format!("{base}/api/settings/alice/move"),
        serde_json::json!({"handle": 6, "value": 7950}),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        json["boundaries"],
        serde_json::json!([0, 1000, 2000, 3000, 4000, 5000, 7800, 7900, 8000])
    );
    assert_eq!(json["breakdown"]["notes"]["absolute"], 2800);
    assert_eq!(json["breakdown"]["input"]["absolute"], 100);
    assert_eq!(json["breakdown"]["output"]["absolute"], 100);
    assert_eq!(json["dirty"], true);
}

#[tokio::test]
async fn move_without_session_returns_404() {
    let (_store, base) = spawn_test_server().await;

    let resp = post_json(
        format!("{base}/api/settings/alice/move"),
        serde_json::json!({"handle": 1, "value": 500}),
    )
    .await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn move_immovable_handle_returns_400() {
    let (_store, base) = spawn_test_server().await;
    reqwest::get(format!("{base}/api/settings/alice"))
        .await
        .unwrap();

    for handle in [0, 8, -3] {
        let resp = post_json(
            format!("{base}/api/settings/alice/move"),
            serde_json::json!({"handle": handle, "value": 500}),
        )
        .await;
        assert_eq!(resp.status(), 400);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert!(json["error"].as_str().unwrap().contains("not movable"));
    }
}

#[tokio::test]
async fn invalid_user_returns_400() {
    let (_store, base) = spawn_test_server().await;

    let resp = reqwest::get(format!("{base}/api/settings/bad.user"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn save_persists_allocation() {
    let (store, base) = spawn_test_server().await;
    reqwest::get(format!("{base}/api/settings/alice"))
        .await
        .unwrap();
    post_json(
        format!("{base}/api/settings/alice/move"),
        serde_json::json!({"handle": 1, "value": 1500}),
    )
    .await;

    let resp = post_json(format!("{base}/api/settings/alice/save"), serde_json::json!({})).await;
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["functions"], 1500);
    assert_eq!(json["ltm1"], 500);
    assert!(json["updated_at"].is_string());

    let saved = store.get("alice").unwrap();
    assert_eq!(saved.allocation.functions, 1500);
    assert_eq!(saved.allocation.checked_total(), Some(8000));

    let snap: serde_json::Value = reqwest::get(format!("{base}/api/settings/alice"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(snap["dirty"], false);
}

#[tokio::test]
async fn save_releases_rest_session() {
    let (store, base) = spawn_test_server().await;
    reqwest::get(format!("{base}/api/settings/alice"))
        .await
        .unwrap();
    post_json(
        format!("{base}/api/settings/alice/move"),
        serde_json::json!({"handle": 2, "value": 2500}),
    )
    .await;
    let resp = post_json(format!("{base}/api/settings/alice/save"), serde_json::json!({})).await;
    assert_eq!(resp.status(), 200);

    // The session is gone until the next GET reopens it from the store.
    let resp = post_json(
        format!("{base}/api/settings/alice/move"),
        serde_json::json!({"handle": 2, "value": 2600}),
    )
    .await;
    assert_eq!(resp.status(), 404);
    let resp = reqwest::Client::new()
        .delete(format!("{base}/api/settings/alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(store.get("alice").unwrap().allocation.ltm1, 1500);
}

#[tokio::test]
async fn full_session_table_evicts_clean_sessions() {
    let (_store, base) = spawn_test_server_with(2).await;
    for user in ["u1", "u2"] {
        reqwest::get(format!("{base}/api/settings/{user}"))
            .await
            .unwrap();
    }
    // u1 gets unsaved changes; u2 stays clean.
    post_json(
        format!("{base}/api/settings/u1/move"),
        serde_json::json!({"handle": 1, "value": 900}),
    )
    .await;

    let resp = reqwest::get(format!("{base}/api/settings/u3")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = post_json(
        format!("{base}/api/settings/u2/move"),
        serde_json::json!({"handle": 1, "value": 900}),
    )
    .await;
    assert_eq!(resp.status(), 404);
    let resp = post_json(
        format!("{base}/api/settings/u1/move"),
        serde_json::json!({"handle": 1, "value": 950}),
    )
    .await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn full_session_table_of_dirty_sessions_returns_503() {
    let (_store, base) = spawn_test_server_with(1).await;
    reqwest::get(format!("{base}/api/settings/u1"))
        .await
        .unwrap();
    post_json(
        format!("{base}/api/settings/u1/move"),
        serde_json::json!({"handle": 1, "value": 900}),
    )
    .await;

    let resp = reqwest::get(format!("{base}/api/settings/u2")).await.unwrap();
    assert_eq!(resp.status(), 503);
}

#[tokio::test]
async fn reset_restores_default_split() {
    let (_store, base) = spawn_test_server().await;
    reqwest::get(format!("{base}/api/settings/alice"))
        .await
        .unwrap();

    let resp = post_json(format!("{base}/api/settings/alice/reset"), serde_json::json!({})).await;
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["breakdown"]["recent"]["absolute"], 2000);
    assert_eq!(json["breakdown"]["notes"]["absolute"], 400);
}

#[tokio::test]
async fn delete_discards_session() {
    let (store, base) = spawn_test_server().await;
    let client = reqwest::Client::new();
    reqwest::get(format!("{base}/api/settings/alice"))
        .await
        .unwrap();
    post_json(
        format!("{base}/api/settings/alice/move"),
        serde_json::json!({"handle": 3, "value": 2500}),
    )
    .await;

    let resp = client
        .delete(format!("{base}/api/settings/alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
    assert_eq!(store.get("alice").unwrap().allocation.ltm2, 1000);

    let resp = client
        .delete(format!("{base}/api/settings/alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn schema_lists_every_category() {
    let (_store, base) = spawn_test_server().await;

    let json: serde_json::Value = reqwest::get(format!("{base}/api/schema"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let props = json["properties"].as_object().unwrap();
    for category in Category::ALL {
        assert!(props.contains_key(category.name()), "{category}");
    }
}

#[tokio::test]
async fn logs_empty_without_buffer() {
    let (_store, base) = spawn_test_server().await;

    let json: serde_json::Value = reqwest::get(format!("{base}/api/logs"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json, serde_json::json!([]));
}

// ── WebSocket Tests ──────────────────────────────────────────────────

type WsClient =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn ws_roundtrip(ws: &mut WsClient, msg: serde_json::Value) -> serde_json::Value {
    ws.send(Message::Text(msg.to_string())).await.unwrap();
    loop {
        match ws.next().await.unwrap().unwrap() {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            _ => continue,
        }
    }
}

#[tokio::test]
async fn ws_open_move_save() {
    let (store, base) = spawn_test_server().await;
    let url = format!("{}/ws", base.replacen("http", "ws", 1));
    let (mut ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    let reply = ws_roundtrip(&mut ws, serde_json::json!({"type": "open", "user": "alice"})).await;
    assert_eq!(reply["type"], "allocation");
    assert_eq!(reply["data"]["boundaries"][7], 7000);

    let reply = ws_roundtrip(
        &mut ws,
        serde_json::json!({"type": "move", "handle": 7, "value": 5050}),
    )
    .await;
    assert_eq!(reply["type"], "allocation");
    // Handle 7 stops two gaps above handle 5 and pulls handle 6 down with it.
    assert_eq!(reply["data"]["boundaries"][6], 5100);
    assert_eq!(reply["data"]["boundaries"][7], 5200);

    let reply = ws_roundtrip(&mut ws, serde_json::json!({"type": "save"})).await;
    assert_eq!(reply["type"], "saved");
    assert_eq!(reply["allocation"]["output"], 2800);
    assert_eq!(store.get("alice").unwrap().allocation.input, 100);
}

#[tokio::test]
async fn ws_reports_errors_without_closing() {
    let (_store, base) = spawn_test_server().await;
    let url = format!("{}/ws", base.replacen("http", "ws", 1));
    let (mut ws, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    let reply = ws_roundtrip(&mut ws, serde_json::json!({"type": "save"})).await;
    assert_eq!(reply["type"], "error");

    let reply = ws_roundtrip(&mut ws, serde_json::json!({"type": "bogus"})).await;
    assert_eq!(reply["type"], "error");

    let reply = ws_roundtrip(&mut ws, serde_json::json!({"type": "open", "user": "dave"})).await;
    assert_eq!(reply["type"], "allocation");
    assert_eq!(reply["data"]["origin"], "default");
}
