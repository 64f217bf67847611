//! Memory-budget panel server.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p membudget-web
//! cargo run -p membudget-web -- --port 8080 --settings-dir .membudget
//! cargo run -p membudget-web -- --static-dir ./panel/out
//! ```
//!
//! Without `--settings-dir`, settings live in memory and are lost on exit.
//!
//! ## Dragging a handle
//!
//! **WebSocket** (connect to `/ws`):
//! ```json
//! {"type": "open", "user": "alice"}
//! {"type": "move", "handle": 6, "value": 7950}
//! ```
//!
//! **REST**:
//! ```bash
//! curl localhost:3001/api/settings/alice
//! curl -X POST localhost:3001/api/settings/alice/move \
//!      -H 'content-type: application/json' -d '{"handle":6,"value":7950}'
//! curl -X POST localhost:3001/api/settings/alice/save
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use membudget::prelude::*;
use membudget_web::{WebConfig, spawn_web};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Memory-budget panel server.
#[derive(Parser)]
#[command(about = "Serve the memory-budget slider panel")]
struct Args {
    /// Port for the web server.
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Directory holding per-user settings files. In-memory if omitted.
    #[arg(long)]
    settings_dir: Option<PathBuf>,

    /// Directory of static frontend files to serve at `/`.
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Budget for users with no saved settings.
    #[arg(long, default_value_t = membudget::config::DEFAULT_MAX_TOKENS)]
    max_tokens: i64,

    /// Minimum gap for users with no saved settings.
    #[arg(long, default_value_t = membudget::config::DEFAULT_MIN_TOKENS)]
    min_tokens: i64,

    /// Floor for the first category (defaults to the gap).
    #[arg(long)]
    first_floor: Option<i64>,

    /// Floor for the last category (defaults to the gap).
    #[arg(long)]
    last_floor: Option<i64>,

    /// Let the input/output handles move independently.
    #[arg(long)]
    no_tail_coupling: bool,

    /// Maximum open REST edit sessions.
    #[arg(long, default_value_t = 1024)]
    max_sessions: usize,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    let (layer, logs) = PanelTracingLayer::new();
    tracing_subscriber::registry().with(layer).init();

    let store: Arc<dyn SettingsStore> = match &args.settings_dir {
        Some(dir) => Arc::new(
            FileSettingsStore::new(dir)
                .map_err(|e| format!("cannot open {}: {e}", dir.display()))?,
        ),
        None => Arc::new(MemorySettingsStore::new()),
    };

    let panel = panel_config(&args);

    let config = WebConfig {
        bind_addr: ([127, 0, 0, 1], args.port).into(),
        static_dir: args.static_dir,
        max_sessions: args.max_sessions,
    };
    let addr = spawn_web(store, panel, Some(logs.clone()), config)
        .await
        .map_err(|e| format!("cannot start server: {e}"))?;

    println!("Panel: http://{addr}");
    tracing::info!(%addr, "panel server listening");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("cannot listen for ctrl-c: {e}"))?;

    println!("Shutting down ({} log lines captured)", logs.len());
    Ok(())
}

fn panel_config(args: &Args) -> PanelConfig {
    let mut panel = PanelConfig::default()
        .with_max_tokens(args.max_tokens)
        .with_min_tokens(args.min_tokens)
        .with_tail_coupling(!args.no_tail_coupling);
    panel.first_floor = args.first_floor;
    panel.last_floor = args.last_floor;
    panel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_and_coupling_flags_reach_panel_config() {
        let args = Args::try_parse_from([
            "membudget-web",
            "--first-floor",
            "300",
            "--last-floor",
            "250",
            "--no-tail-coupling",
        ])
        .unwrap();
        let panel = panel_config(&args);
        assert_eq!(panel.first_floor, Some(300));
        assert_eq!(panel.last_floor, Some(250));
        assert!(!panel.couple_tail);

        let config = panel.allocator_config(8000, 100);
        assert_eq!(config.first_floor, 300);
        assert_eq!(config.last_floor, 250);
    }

    #[test]
    fn defaults_keep_tail_coupled() {
        let args = Args::try_parse_from(["membudget-web"]).unwrap();
        let panel = panel_config(&args);
        assert_eq!(panel, PanelConfig::default());
        assert_eq!(args.max_sessions, 1024);
    }
}
