use std::sync::Arc;

use soundvault_core::assets::AssetStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: soundvault_db::DbPool,
    /// Server configuration, resolved once at startup.
    pub config: Arc<ServerConfig>,
    /// Uploaded asset directory.
    pub assets: Arc<AssetStore>,
}
