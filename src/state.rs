//! Shared application state for all routes.

use crate::config::{EntityRegistry, Settings};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    /// Built once at startup; never mutated.
    pub registry: Arc<EntityRegistry>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(pool: SqlitePool, registry: EntityRegistry, settings: Settings) -> Self {
        AppState {
            pool,
            registry: Arc::new(registry),
            settings: Arc::new(settings),
        }
    }
}
