//! Pedagen · Teaching-materials generator backend
//!
//! - Axum HTTP + WebSocket API
//! - Paste text and/or upload documents, pick a Bloom level, get back a quiz,
//!   a case study, a video script, an infographic outline and an activity plan
//! - Generation via Gemini (one structured-JSON call per request)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                 : u16 (default 3000)
//!   GEMINI_API_KEY       : enables generation if present (API_KEY also accepted)
//!   GEMINI_BASE_URL      : default "https://generativelanguage.googleapis.com/v1beta"
//!   GEMINI_MODEL         : default "gemini-2.5-flash"
//!   GEMINI_TIMEOUT_SECS  : transport timeout, default 120
//!   PROMPTS_CONFIG_PATH  : path to TOML prompt overrides
//!   MAX_UPLOAD_BYTES     : request body limit, default 25 MiB
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod encoder;
mod request;
mod response;
mod gemini;
mod logic;
mod render;
mod state;
mod protocol;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let server = ServerConfig::from_env();

  // Shared, read-only application state (prompts, model client).
  let state = Arc::new(AppState::new(&server));

  let app = build_router(state);

  let addr = SocketAddr::from(([0, 0, 0, 0], server.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "pedagen_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "pedagen_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "pedagen_backend", "Shutdown signal received");
}
