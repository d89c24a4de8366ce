//! Explanation personalizer.
//!
//! Every recommendation the predict endpoint returns carries a short Spanish
//! explanation and, for the "improved soft skills" alternatives, a phrase
//! tying the suggested skills to the posting. The backend is pluggable
//! behind the `Personalizer` trait: the deterministic template backend is
//! the default, the OpenAI-compatible backend is enabled when both an API
//! key and a model are configured.

pub mod llm;
pub mod template;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::Config;
use crate::models::recommendation::Recommendation;

use self::llm::LlmPersonalizer;
use self::template::TemplatePersonalizer;

/// Diagnostic snapshot surfaced by the info endpoint and 503 responses.
#[derive(Debug, Clone, Serialize)]
pub struct PersonalizerStatus {
    pub enabled: bool,
    pub model: String,
    pub require_llm: bool,
    pub client_ready: bool,
}

/// Student-side inputs every explanation call shares.
#[derive(Debug, Clone, Copy)]
pub struct ExplainContext<'a> {
    pub career: &'a str,
    pub subjects: &'a str,
    pub ratings: &'a [i64],
}

#[async_trait]
pub trait Personalizer: Send + Sync {
    /// One explanation per recommendation, index-aligned.
    async fn explain_batch(
        &self,
        recommendations: &[Recommendation],
        ctx: ExplainContext<'_>,
    ) -> Vec<String>;

    /// Explanations for the alternative list; `suggestions[i]` holds the
    /// soft-skill labels proposed for `recommendations[i]`.
    async fn explain_alternatives(
        &self,
        recommendations: &[Recommendation],
        suggestions: &[Vec<String>],
        ctx: ExplainContext<'_>,
    ) -> Vec<String>;

    /// Advice paragraph shown with the alternative recommendations.
    async fn soft_skills_advice(&self, ctx: ExplainContext<'_>) -> String;

    fn status(&self) -> PersonalizerStatus;
}

/// Picks the backend from configuration: LLM when fully configured,
/// deterministic templates otherwise.
pub fn from_config(config: &Config) -> Arc<dyn Personalizer> {
    match (&config.openai_api_key, &config.openai_model) {
        (Some(key), Some(model)) if !key.is_empty() && !model.is_empty() => {
            Arc::new(LlmPersonalizer::new(
                key.clone(),
                model.clone(),
                config.openai_base_url.clone(),
                config.require_llm,
            ))
        }
        _ => Arc::new(TemplatePersonalizer::new(config.require_llm)),
    }
}
