//! reqprom server
//!
//! - Demo HTTP host instrumented with request/response metrics
//! - `/metrics` scrape endpoint on the process-wide registry
//! - Config from `REQPROM_CONFIG` (default `reqprom.yaml`), defaults if absent

use std::path::Path;

use tracing_subscriber::{fmt, EnvFilter};

use reqprom_core::error::{ReqPromError, Result};
use reqprom_server::{app_state, config, router};

const DEFAULT_CONFIG_PATH: &str = "reqprom.yaml";

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, code = err.code().as_str(), "reqprom-server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::var("REQPROM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = if Path::new(&path).exists() {
        config::load_from_file(&path)?
    } else {
        tracing::info!(%path, "config file not found; using defaults");
        config::ServerConfig::default()
    };
    let listen = cfg.server.listen_addr()?;

    let state = app_state::AppState::new(cfg, prometheus::default_registry().clone())?;
    let app = router::build_router(state);

    tracing::info!(%listen, "reqprom-server starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| ReqPromError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ReqPromError::Internal(format!("server failed: {e}")))
}
