use std::sync::Arc;

use crate::services::ai::router::ModelRouter;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ModelRouter>,
    /// Credential forwarded verbatim to the generation backend.
    pub api_key: String,
}

impl AppState {
    pub fn new(router: ModelRouter, api_key: String) -> Self {
        Self {
            router: Arc::new(router),
            api_key,
        }
    }
}
