//! Browser panel for editing memory-budget allocations.
//!
//! `membudget-web` serves the slider over a WebSocket (one edit session per
//! connection, a snapshot after every drag) and a REST API (one edit session
//! per user, shared by all HTTP clients). Both persist through the same
//! [`SettingsStore`].
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use membudget::prelude::*;
//! use membudget_web::{WebConfig, spawn_web};
//!
//! let store = Arc::new(FileSettingsStore::new(".membudget")?);
//! let addr = spawn_web(store, PanelConfig::default(), None, WebConfig::default()).await?;
//! println!("Panel: http://{addr}");
//! ```
//!
//! # Protocol
//!
//! ```text
//! client ──{"type":"open","user":"alice"}──▶ server ──{"type":"allocation",..}──▶ client
//! client ──{"type":"move","handle":6,"value":7950}──▶ server ──{"type":"allocation",..}──▶ client
//! client ──{"type":"save"}──▶ server ──{"type":"saved",..}──▶ client
//! ```

mod api;
pub mod message;
mod server;
pub mod snapshot;
mod ws;

pub use message::{ClientMessage, WsMessage};
pub use snapshot::AllocationSnapshot;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use membudget::config::PanelConfig;
use membudget::log::LogBuffer;
use membudget::settings::SettingsStore;

/// Configuration for the web server.
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3001`.
    pub bind_addr: SocketAddr,
    /// Directory of static frontend files to serve at `/`.
    ///
    /// If `None`, only API/WS endpoints are served.
    pub static_dir: Option<PathBuf>,
    /// Maximum open REST edit sessions. Default: 1024.
    ///
    /// When full, sessions without unsaved changes are dropped to admit a
    /// new user; if every session is dirty the request gets a 503.
    pub max_sessions: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            static_dir: None,
            max_sessions: 1024,
        }
    }
}

/// Spawn the web server on a Tokio task and return the bound address.
///
/// The server runs until the Tokio runtime shuts down.
///
/// # Arguments
///
/// * `store`: Where settings are loaded from and saved to.
/// * `panel`: Defaults applied to users with no (or invalid) stored settings.
/// * `logs`: Captured log lines to expose at `GET /api/logs`, if any.
/// * `config`: Server configuration.
pub async fn spawn_web(
    store: Arc<dyn SettingsStore>,
    panel: PanelConfig,
    logs: Option<LogBuffer>,
    config: WebConfig,
) -> std::io::Result<SocketAddr> {
    let router = server::build_router(
        store,
        panel,
        logs,
        config.max_sessions,
        config.static_dir,
    );
    server::start_server(router, config.bind_addr).await
}
