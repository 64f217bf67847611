//! Inspect and edit a user's memory-budget allocation from the terminal.
//!
//! Settings are read from and written to `<settings-dir>/<user>.json`, the
//! same files the web panel uses.
//!
//! # Examples
//!
//! ```sh
//! # Show the current split
//! membudget --user alice show
//!
//! # Drag handle 6 (input/output edge) to 7950 and save
//! membudget --user alice move 6=7950 --save
//!
//! # Several moves, applied left to right
//! membudget --user alice move 1=1200 3=3500 --save
//!
//! # Restore the default split
//! membudget --user alice reset --save
//!
//! # Print the JSON Schema of the settings record
//! membudget schema
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use membudget::prelude::*;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Inspect and edit memory-budget allocations.
#[derive(Parser)]
#[command(name = "membudget")]
struct Cli {
    /// Directory holding per-user settings files.
    #[arg(long, default_value = ".membudget")]
    settings_dir: PathBuf,

    /// User whose settings to edit.
    #[arg(long, default_value = "default")]
    user: String,

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

    /// Print captured debug logs (clamps, cascades) to stderr.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the current allocation.
    Show {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Move one or more handles, given as HANDLE=VALUE.
    Move {
        #[arg(value_parser = parse_move, required = true)]
        moves: Vec<(usize, i64)>,
        /// Persist the result.
        #[arg(long)]
        save: bool,
    },
    /// Restore the default split for the user's budget.
    Reset {
        /// Persist the result.
        #[arg(long)]
        save: bool,
    },
    /// Print the JSON Schema of a settings record.
    Schema,
}

fn main() -> Result<(), String> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let (layer, logs) = PanelTracingLayer::with_level(level);
    tracing_subscriber::registry().with(layer).init();

    let result = run(&cli);

    for line in logs.drain() {
        eprintln!("{}", line.to_display_string());
    }
    result
}

fn run(cli: &Cli) -> Result<(), String> {
    if let Command::Schema = cli.command {
        let schema = membudget::user_settings_schema();
        println!(
            "{}",
            serde_json::to_string_pretty(&schema).map_err(|e| e.to_string())?
        );
        return Ok(());
    }

    let mut panel = PanelConfig::default()
        .with_max_tokens(cli.max_tokens)
        .with_min_tokens(cli.min_tokens)
        .with_tail_coupling(!cli.no_tail_coupling);
    panel.first_floor = cli.first_floor;
    panel.last_floor = cli.last_floor;

    let store = FileSettingsStore::new(&cli.settings_dir)
        .map_err(|e| format!("cannot open {}: {e}", cli.settings_dir.display()))?;
    let mut session = EditSession::open(&store, &cli.user, &panel).map_err(|e| e.to_string())?;

    let save = match &cli.command {
        Command::Show { json } => {
            if *json {
                let out = serde_json::json!({
                    "user": session.user(),
                    "total": session.total(),
                    "min_gap": session.min_gap(),
                    "boundaries": session.boundaries(),
                    "breakdown": session.breakdown(),
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?
                );
                return Ok(());
            }
            false
        }
        Command::Move { moves, save } => {
            for &(handle, value) in moves {
                let b = session
                    .move_handle(handle, value)
                    .map_err(|e| e.to_string())?;
                if b[handle] != value {
                    println!("handle {handle}: requested {value}, clamped to {}", b[handle]);
                }
            }
            *save
        }
        Command::Reset { save } => {
            session.reset().map_err(|e| e.to_string())?;
            *save
        }
        Command::Schema => return Ok(()),
    };

    print_table(&session);

    if save {
        session.save(&store).map_err(|e| e.to_string())?;
        let path = cli.settings_dir.join(format!("{}.json", cli.user));
        println!("saved {}", path.display());
    } else if session.is_dirty() {
        println!("(not saved; pass --save to persist)");
    }
    Ok(())
}

fn print_table(session: &EditSession) {
    let origin = match session.origin() {
        Origin::Stored => "stored",
        Origin::Default => "default",
        Origin::Fallback => "default, stored settings were invalid",
    };
    println!(
        "{} | budget {} | gap {} | {origin}",
        session.user(),
        session.total(),
        session.min_gap()
    );
    let bounds = session.boundaries();
    for (category, share) in session.breakdown().iter() {
        let i = category.index();
        println!(
            "  {:<20} {:>8} {:>7.2}%   [{} .. {}]",
            category.label(),
            share.absolute,
            share.percentage,
            bounds[i],
            bounds[i + 1]
        );
    }
}

/// Parse `HANDLE=VALUE`.
fn parse_move(s: &str) -> Result<(usize, i64), String> {
    let (handle, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected HANDLE=VALUE, got {s:?}"))?;
    let handle = handle
        .trim()
        .parse()
        .map_err(|e| format!("bad handle {handle:?}: {e}"))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("bad value {value:?}: {e}"))?;
    Ok((handle, value))
}
