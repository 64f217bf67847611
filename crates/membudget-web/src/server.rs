//! Axum server setup and router construction.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::routing::{get, post};
use membudget::config::PanelConfig;
use membudget::log::LogBuffer;
use membudget::settings::SettingsStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::error;

use crate::api::{self, AppState};
use crate::ws::{self, WsState};

/// Build the full axum router.
///
/// The router serves:
/// - WebSocket at `/ws`
/// - REST API at `/api/*`
/// - Optional static files for the panel frontend
pub fn build_router(
    store: Arc<dyn SettingsStore>,
    panel: PanelConfig,
    logs: Option<LogBuffer>,
    max_sessions: usize,
    static_dir: Option<PathBuf>,
) -> Router {
    let panel = Arc::new(panel);

    let app_state = AppState {
        sessions: Arc::new(Mutex::new(HashMap::new())),
        store: store.clone(),
        panel: panel.clone(),
        logs,
        max_sessions,
    };

    let ws_state = WsState { store, panel };

    // Frontend dev servers run on a different port.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .with_state(ws_state);

    let api_routes = Router::new()
        .route(
            "/api/settings/{user}",
            get(api::get_settings).delete(api::delete_settings),
        )
        .route("/api/settings/{user}/move", post(api::post_move))
        .route("/api/settings/{user}/save", post(api::post_save))
        .route("/api/settings/{user}/reset", post(api::post_reset))
        .route("/api/schema", get(api::get_schema))
        .route("/api/logs", get(api::get_logs))
        .with_state(app_state);

    let mut router = Router::new().merge(ws_routes).merge(api_routes).layer(cors);

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
}

/// Bind the listener, start serving on a background task, and return the
/// bound address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("web server stopped: {e}");
        }
    });

    Ok(addr)
}
