//! Application state shared across handlers and the ingestor.

use std::sync::Arc;

use roomenv_store::Store;
use tokio::sync::Mutex;

use crate::config::Config;

/// Shared application state.
///
/// The store is opened once at startup. rusqlite connections are not `Sync`,
/// so every store call takes the mutex for the duration of that call only.
pub struct AppState {
    /// The sample store.
    pub store: Mutex<Store>,
    /// Configuration loaded at startup.
    pub config: Config,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: Store, config: Config) -> Arc<Self> {
        Arc::new(Self {
            store: Mutex::new(store),
            config,
        })
    }
}
