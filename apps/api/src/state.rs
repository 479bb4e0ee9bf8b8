use std::sync::Arc;

use crate::export::ExportSettings;
use crate::llm_client::CompletionService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Completion backend. `OpenAiClient` in production, built once at startup.
    pub llm: Arc<dyn CompletionService>,
    /// Export directory, PDF page layout and markup options.
    pub export: ExportSettings,
}
