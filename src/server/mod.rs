//! HTTP relay exposing the identification route.

mod errors;
mod handlers;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::identify::{PlantIdClient, DEFAULT_NETWORK_RETRIES};

pub use errors::{AppError, ErrorBody};
pub use routes::{build_router, MAX_BODY_BYTES};

/// Shared state for request handlers.
#[derive(Debug)]
pub struct AppState {
    pub upstream: PlantIdClient,
    /// Retries for transient upstream network failures
    pub network_retries: u32,
}

impl AppState {
    pub fn new(upstream: PlantIdClient) -> Self {
        Self {
            upstream,
            network_retries: DEFAULT_NETWORK_RETRIES,
        }
    }

    pub fn with_network_retries(mut self, retries: u32) -> Self {
        self.network_retries = retries;
        self
    }
}

/// Bind `addr` and serve the relay until Ctrl+C.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    log::info!("Identification relay listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Could not listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down identification relay");
}
