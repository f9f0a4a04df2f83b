//! Courtside HTTP Server Binary
//!
//! Main entry point for the booking engine's REST API server. It builds the
//! reservation store, wires up the booking service, and starts serving.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin courtside-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `REPOSITORY_TYPE`: Store backend, `local`/`memory` (default: local)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use courtside::db::RepositoryFactory;
use courtside::http::{create_router, AppState};
use courtside::services::{BookingService, Clock, EventSink, LogEventSink, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting Courtside HTTP Server");

    let repository = RepositoryFactory::from_env()?;
    info!("Reservation store initialized successfully");

    let service = BookingService::new(
        repository,
        Arc::new(SystemClock) as Arc<dyn Clock>,
        Arc::new(LogEventSink) as Arc<dyn EventSink>,
    );
    let state = AppState::new(Arc::new(service));

    // Create router with all endpoints
    let app = create_router(state);

    // Determine bind address
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
