// Application state module
// Built once at startup and shared by every connection

use std::sync::Arc;

use super::types::Config;
use crate::logger;
use crate::store::{CommentStore, JsonFileStore, StoreError};

/// Application state
pub struct AppState {
    pub config: Config,
    /// Shared with blocking tasks that do the file I/O
    pub store: Arc<dyn CommentStore>,
}

impl AppState {
    /// Create `AppState` with the JSON file store from `storage.data_file`
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let store = JsonFileStore::open(&config.storage.data_file)?;
        logger::log_info(&format!(
            "Comments stored in: {}",
            store.path().display()
        ));
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Create `AppState` around an already opened store
    pub fn with_store(config: &Config, store: Arc<dyn CommentStore>) -> Self {
        Self {
            config: config.clone(),
            store,
        }
    }
}
