use std::sync::Arc;

use crate::config::Config;
use crate::engine::RecommendationEngine;
use crate::personalizer::Personalizer;
use crate::reference::careers::CareerResolver;
use crate::reference::ReferenceData;
use crate::vectorizer::StudentVectorizer;

/// Shared application state injected into all route handlers via Axum
/// extractors. Everything except the engine's internal cache is read-only.
#[derive(Clone)]
pub struct AppState {
    pub reference: Arc<ReferenceData>,
    pub resolver: Arc<CareerResolver>,
    pub vectorizer: Arc<StudentVectorizer>,
    pub engine: Arc<RecommendationEngine>,
    /// Pluggable explanation backend. Default: templates. Swapped to the LLM
    /// backend when OPENAI_API_KEY and OPENAI_MODEL are configured.
    pub personalizer: Arc<dyn Personalizer>,
    pub config: Config,
}
