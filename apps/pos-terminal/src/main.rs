//! # farma-pos
//!
//! Starts the operator terminal.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Parse flags (clap)                                                  │
//! │  2. Tracing to stderr (RUST_LOG, default info,farma=debug)              │
//! │  3. TerminalConfig: defaults ◄ terminal.toml ◄ FARMA_* env ◄ flags      │
//! │  4. FarmaClient (cookie session, timeout)                               │
//! │  5. Session probe, first route, operator loop                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use farma_api::FarmaClient;
use pos_terminal::config::CliOverrides;
use pos_terminal::receipts::ReceiptExporter;
use pos_terminal::router::Route;
use pos_terminal::state::AppState;
use pos_terminal::{repl, App, TerminalConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Farma POS - pharmacy counter terminal", long_about = None)]
struct Args {
    /// Config file (defaults to the platform config dir).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Backend base URL, e.g. http://localhost:5000
    #[arg(long, env = "FARMA_BACKEND_URL")]
    backend_url: Option<String>,
    /// Request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Branch (sucursal) id sent with every invoice.
    #[arg(long)]
    branch_id: Option<i64>,
    /// Store name printed on receipts.
    #[arg(long)]
    store_name: Option<String>,
    /// Directory for exported receipts.
    #[arg(long, value_name = "DIR")]
    receipts_dir: Option<PathBuf>,
    /// Open each receipt in the browser for printing.
    #[arg(long)]
    open_receipts: bool,
    /// Write the effective configuration to the config file and exit.
    #[arg(long)]
    save_config: bool,
    /// Route to open first.
    #[arg(long, default_value = "#/ventas")]
    route: String,
}

/// Log to stderr so the operator screen on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,farma=debug,pos_terminal=debug"));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = TerminalConfig::load(args.config.clone())
        .context("failed to load terminal configuration")?;
    config
        .apply_cli(CliOverrides {
            backend_url: args.backend_url,
            timeout_secs: args.timeout_secs,
            branch_id: args.branch_id,
            store_name: args.store_name,
            receipts_dir: args.receipts_dir,
            open_receipts: args.open_receipts,
        })
        .context("invalid command-line settings")?;

    if args.save_config {
        let path = config
            .save(args.config)
            .context("failed to save terminal configuration")?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    info!(
        backend = %config.backend.base_url,
        branch_id = config.store.branch_id,
        "Starting Farma POS terminal"
    );

    let client = FarmaClient::new(config.client_config())
        .with_context(|| format!("cannot use backend URL {}", config.backend.base_url))?;
    let exporter = ReceiptExporter::from_config(&config);
    let (app, searches) = App::new(AppState::new(config), Arc::new(client), exporter);

    repl::run(app, searches, Route::parse(&args.route))
        .await
        .context("terminal loop failed")?;
    Ok(())
}
