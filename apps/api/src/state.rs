use std::sync::Arc;

use crate::config::Config;
use crate::store::FleetStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Data-access capability. Postgres in production, in-memory for tests and demos.
    pub store: Arc<dyn FleetStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn FleetStore>, config: Config) -> Self {
        Self { store, config }
    }
}
