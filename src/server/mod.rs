//! HTTP surface of the inventory, mounted under `/api`.

pub mod error;
pub mod handlers;

use crate::core::Inventory;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inventory: Arc<RwLock<Inventory>>,
    monitor: Arc<SystemMonitor>,
    start_time: Instant,
}

impl AppState {
    pub fn new(inventory: Inventory, monitor: SystemMonitor) -> Self {
        Self {
            inventory: Arc::new(RwLock::new(inventory)),
            monitor: Arc::new(monitor),
            start_time: Instant::now(),
        }
    }

    pub fn inventory(&self) -> Arc<RwLock<Inventory>> {
        Arc::clone(&self.inventory)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/get_cargo", get(handlers::get_cargo))
        .route("/add_cargo", post(handlers::add_cargo))
        .route("/delete_cargo/:id", delete(handlers::delete_cargo))
        .route("/placement", post(handlers::placement))
        .route("/waste/return-plan", post(handlers::return_plan))
        .route("/retrieve/:id", post(handlers::retrieve))
        .route("/simulate/day", post(handlers::simulate_day))
        .route("/export/arrangement", get(handlers::export_arrangement))
        .route("/import/items", post(handlers::import_items))
        .route("/alerts", get(handlers::alerts))
        .route("/metrics", get(handlers::metrics))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🚀 Listening on http://{}/api", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
