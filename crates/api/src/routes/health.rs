//! Liveness endpoint, mounted outside `/api`.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct Health {
    /// `ok`, or `degraded` when the database is unreachable.
    status: &'static str,
    version: &'static str,
    db_healthy: bool,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    let db_healthy = match soundvault_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    Json(Health {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
