//! Application state management

use std::sync::Arc;

use keygen_core::KeyManager;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub key_manager: Arc<KeyManager>,
}

impl AppState {
    pub fn new(key_manager: KeyManager) -> Self {
        Self {
            key_manager: Arc::new(key_manager),
        }
    }
}
