use std::sync::Arc;

use crate::config::Config;
use crate::curriculum::Catalog;
use crate::gemini::GeminiClient;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub gemini: GeminiClient,
    pub catalog: Arc<Catalog>,
    pub config: Config,
}
