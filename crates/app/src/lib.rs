//! Version manager application composition root
//!
//! Composes the lifecycle router with shared infrastructure routes.

use axum::{http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use vermgr_common::Store;
use vermgr_lifecycle::{LifecycleState, LifecycleStore};

/// Create the main application router with all routes
pub fn create_app(store: Store) -> Router {
    let lifecycle_state = LifecycleState::new(LifecycleStore::new(store));

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/",
            get(|| async { concat!("Version Manager API v", env!("CARGO_PKG_VERSION")) }),
        )
        .merge(vermgr_lifecycle::routes().with_state(lifecycle_state))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
