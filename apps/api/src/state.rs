//! Shared application state.

use std::sync::Arc;

use stockroom_db::Database;

use crate::config::ServerConfig;

/// Handed to every handler by axum. Cloning is cheap: the pool and the
/// config are both reference counted.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}
