//! REST API - axum router, shared state and server entry point.
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET | `/orders/` | [`orders::list_orders`] |
//! | POST | `/orders/` | [`orders::create_order`] |
//! | GET | `/orders/{id}/` | [`orders::retrieve_order`] |
//! | DELETE | `/orders/{id}/` | [`orders::destroy_order`] |
//! | PATCH | `/order-lines/{id}/` | [`order_lines::partial_update`] |
//!
//! Every route sits behind [`auth::require_token`].

/// Token authentication middleware
pub mod auth;
/// HTTP mapping of crate errors
pub mod error;
/// Order line handlers
pub mod order_lines;
/// Order handlers
pub mod orders;
/// JSON representations
pub mod serializers;

#[cfg(test)]
mod tests;

use crate::{
    config::AppConfig,
    errors::{Error, Result},
};
use axum::{
    Router,
    extract::{Path, rejection::PathRejection},
    middleware,
    routing::{get, patch},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared data available to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection for all database operations
    pub db: Arc<DatabaseConnection>,
    /// Application settings
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Creates the handler state from a connection and settings.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }
}

/// Reads a numeric `{id}` path segment. Anything else names no record and
/// is answered like a missing one.
pub(crate) fn record_id(path: std::result::Result<Path<i64>, PathRejection>) -> Result<i64> {
    path.map(|Path(id)| id).map_err(|rejection| Error::InvalidId {
        message: rejection.body_text(),
    })
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/orders/",
            get(orders::list_orders).post(orders::create_order),
        )
        .route(
            "/orders/:id/",
            get(orders::retrieve_order).delete(orders::destroy_order),
        )
        .route("/order-lines/:id/", patch(order_lines::partial_update))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received.");
}

/// Serves the API on `state.config.server.bind_addr` until Ctrl-C.
pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.config.server.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Order API listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
