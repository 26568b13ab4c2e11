//! Shared application state.

use std::sync::Arc;

use bodhi_chain::ChainGate;
use bodhi_core::RowStore;

/// Process-wide clients, built once at startup and cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RowStore>,
    pub gate: Arc<ChainGate>,
    /// Secret required by `/set_img`; `None` refuses every mutation.
    pub admin_key: Option<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn RowStore>, gate: ChainGate, admin_key: Option<String>) -> Self {
        Self {
            store,
            gate: Arc::new(gate),
            admin_key,
        }
    }

    /// Exact match against the configured admin key. Without a configured
    /// key nothing matches.
    pub fn admin_key_matches(&self, candidate: Option<&str>) -> bool {
        match (self.admin_key.as_deref(), candidate) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        }
    }
}
