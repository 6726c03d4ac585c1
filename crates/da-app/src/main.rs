//! Tabular analysis server: upload a CSV or spreadsheet, get descriptive
//! statistics back, then request per-column histogram renders.
//!
//! # Endpoints
//!
//! - `POST /upload`: multipart file in, summary statistics JSON out
//! - `POST /visualize`: `{filename, column}` JSON in, histogram artifact URL out
//! - `GET /static/*`: rendered histogram images
//! - `GET /health`: server status

mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use da_data::{FsArtifactStore, FsBlobStore};
use state::AppState;

/// Analyst-facing tabular statistics and histogram server.
#[derive(Parser, Debug)]
#[command(name = "danalyst", version, about)]
struct Cli {
    /// Port to listen on.
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Bind address.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Root directory for uploads and rendered graphs.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Maximum request body size in MiB.
    #[arg(long, default_value = "64")]
    max_body_mb: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();

    // Bootstrap the two storage directories once at startup; both stores
    // create their roots if missing.
    let upload_dir = cli.data_dir.join("uploads");
    let static_dir = cli.data_dir.join("static");
    let graphs_dir = static_dir.join("graphs");

    let uploads = FsBlobStore::new(&upload_dir)
        .with_context(|| format!("creating upload directory {}", upload_dir.display()))?;
    let artifacts = FsArtifactStore::new(&graphs_dir)
        .with_context(|| format!("creating graphs directory {}", graphs_dir.display()))?;

    let state = Arc::new(AppState::new(Arc::new(uploads), Arc::new(artifacts)));

    let app = Router::new()
        .merge(routes::router())
        .nest_service("/static", ServeDir::new(&static_dir))
        .layer(DefaultBodyLimit::max(mb_to_bytes(cli.max_body_mb)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    tracing::info!(
        %addr,
        data_dir = %cli.data_dir.display(),
        "danalyst server starting"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn mb_to_bytes(mb: usize) -> usize {
    // Clamp overflow to usize::MAX to avoid panics in debug builds.
    mb.saturating_mul(1024).saturating_mul(1024)
}
