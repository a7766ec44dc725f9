//! Application state: prompts, upload limit, and the optional model client.
//!
//! Nothing here is mutated after startup; each generation builds and drops its
//! own request, so concurrent requests share no mutable data.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::{load_prompts_config_from_env, Prompts, ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};
use crate::error::GenerationError;
use crate::gemini::{Gemini, ResourceModel};

#[derive(Clone)]
pub struct AppState {
    pub model: Option<Arc<dyn ResourceModel>>,
    pub prompts: Prompts,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Build state from env: load prompt overrides, init the Gemini client.
    #[instrument(level = "info", skip_all)]
    pub fn new(server: &ServerConfig) -> Self {
        let prompts = load_prompts_config_from_env()
            .map(|c| c.prompts)
            .unwrap_or_default();

        let model: Option<Arc<dyn ResourceModel>> = match Gemini::from_env() {
            Some(g) => {
                info!(target: "pedagen_backend", base_url = %g.base_url, model = %g.model, "Gemini enabled.");
                Some(Arc::new(g))
            }
            None => {
                warn!(target: "pedagen_backend", "Gemini disabled (no GEMINI_API_KEY). Generation requests will be refused.");
                None
            }
        };

        Self { model, prompts, max_upload_bytes: server.max_upload_bytes }
    }

    /// State around an explicit model, with default prompts and limits.
    pub fn with_model(model: Option<Arc<dyn ResourceModel>>) -> Self {
        Self { model, prompts: Prompts::default(), max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES }
    }

    pub fn model(&self) -> Result<&dyn ResourceModel, GenerationError> {
        self.model.as_deref().ok_or(GenerationError::NotConfigured)
    }
}
