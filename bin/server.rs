// College Finder - Web Server
// REST API over the college catalog with Axum

use anyhow::{Context, Result};
use clap::Parser;
use college_finder::{api, import::load_catalog, init_tracing, load_config, LogFormat};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "college-server", version, about = "Serve the college catalog over HTTP")]
struct Args {
    /// Configuration file
    #[arg(long, env = "COLLEGE_FINDER_CONFIG")]
    config: Option<PathBuf>,

    /// Spreadsheet to serve instead of the built-in list
    #[arg(long)]
    data: Option<PathBuf>,

    /// Listen address, overrides `[server] addr`
    #[arg(long)]
    addr: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose, args.log_format);

    println!("🌐 College Finder - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = load_config(args.config.as_deref())?;
    let data_file = args.data.or(config.catalog.data_file);

    let catalog = load_catalog(data_file.as_deref()).context("failed to load catalog")?;
    println!("✓ Catalog loaded: {} colleges from {}", catalog.len(), catalog.source());

    let app = api::router(api::AppState::new(catalog));

    let addr = args.addr.unwrap_or(config.server.addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    info!(%addr, "listening");

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/colleges", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
