//! OpenAI-compatible explanation backend.
//!
//! All LLM traffic for the service goes through this client. Calls retry on
//! 429 and 5xx with exponential backoff; any failure falls back to the
//! deterministic template backend per item, so the predict endpoint never
//! blocks on a flaky upstream.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::recommendation::Recommendation;

use super::template::TemplatePersonalizer;
use super::{ExplainContext, Personalizer, PersonalizerStatus};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MAX_TOKENS: u32 = 400;
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct LlmPersonalizer {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    require_llm: bool,
    fallback: TemplatePersonalizer,
}

impl LlmPersonalizer {
    pub fn new(
        api_key: String,
        model: String,
        base_url: Option<String>,
        require_llm: bool,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("failed to build HTTP client"),
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            require_llm,
            fallback: TemplatePersonalizer::new(require_llm),
        }
    }

    /// One chat call with retry on 429/5xx. Returns the assistant text.
    async fn chat(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: 0.2,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error = LlmError::RateLimited {
            retries: MAX_RETRIES,
        };

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(attempt, delay_ms = delay.as_millis() as u64, "retrying LLM call");
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    last_error = LlmError::Http(err);
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                last_error = LlmError::Api {
                    status: status.as_u16(),
                    message: response.text().await.unwrap_or_default(),
                };
                continue;
            }
            if !status.is_success() {
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: response.text().await.unwrap_or_default(),
                });
            }

            let parsed: ChatResponse = response.json().await?;
            let text = parsed
                .choices
                .first()
                .and_then(|c| c.message.content.as_deref())
                .map(str::trim)
                .unwrap_or_default();
            if text.is_empty() {
                return Err(LlmError::EmptyContent);
            }
            debug!(chars = text.len(), "LLM explanation generated");
            return Ok(text.to_string());
        }
        Err(last_error)
    }

    /// Batch prompt: one numbered line per recommendation, answered with one
    /// numbered explanation per line.
    fn batch_prompt(recommendations: &[Recommendation], ctx: ExplainContext<'_>) -> String {
        let mut prompt = format!(
            "Explica en una frase breve (español, tono profesional) por qué cada oferta \
             encaja con un perfil de {} con asignaturas '{}'. Responde exactamente una \
             línea numerada por oferta, sin texto adicional.\n",
            ctx.career, ctx.subjects
        );
        for (i, rec) in recommendations.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. cargo: {}; skills: {}; competencias: {}\n",
                i + 1,
                rec.title,
                rec.skills,
                rec.eurace_skills
            ));
        }
        prompt
    }

    /// Parses "1. ..." / "- ..." style lines back into one entry per item.
    fn parse_batch_lines(text: &str, expected: usize) -> Vec<String> {
        let lines: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|line| {
                let stripped = line
                    .trim_start_matches(|c: char| c.is_ascii_digit())
                    .trim_start_matches('.')
                    .trim_start_matches('-')
                    .trim_start();
                stripped.to_string()
            })
            .collect();
        lines.into_iter().take(expected).collect()
    }
}

#[async_trait]
impl Personalizer for LlmPersonalizer {
    async fn explain_batch(
        &self,
        recommendations: &[Recommendation],
        ctx: ExplainContext<'_>,
    ) -> Vec<String> {
        if recommendations.is_empty() {
            return Vec::new();
        }
        let prompt = Self::batch_prompt(recommendations, ctx);
        let parsed = match self
            .chat("Eres un orientador laboral conciso.", &prompt)
            .await
        {
            Ok(text) => Self::parse_batch_lines(&text, recommendations.len()),
            Err(err) => {
                warn!(error = %err, "LLM batch failed, using template fallback");
                Vec::new()
            }
        };
        // per-item fallback for missing or empty lines
        recommendations
            .iter()
            .enumerate()
            .map(|(i, rec)| match parsed.get(i) {
                Some(line) if !line.is_empty() => line.clone(),
                _ => TemplatePersonalizer::explain_one(rec, ctx),
            })
            .collect()
    }

    async fn explain_alternatives(
        &self,
        recommendations: &[Recommendation],
        suggestions: &[Vec<String>],
        ctx: ExplainContext<'_>,
    ) -> Vec<String> {
        // the alternative list is small and the template output is already
        // posting-specific; the LLM only rewrites the primary batch
        self.fallback
            .explain_alternatives(recommendations, suggestions, ctx)
            .await
    }

    async fn soft_skills_advice(&self, ctx: ExplainContext<'_>) -> String {
        let prompt = format!(
            "Redacta un párrafo breve (2-3 frases, español) de consejo para un estudiante \
             de {} que busca mejorar sus habilidades blandas. Puntajes (1-5) en el orden \
             Gestión, Comunicación, Liderazgo, Trabajo en equipo, Ética, Responsabilidad, \
             Aprendizaje: {:?}. Sin markdown ni encabezados.",
            ctx.career, ctx.ratings
        );
        match self.chat("Eres un orientador laboral conciso.", &prompt).await {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "LLM advice failed, using template fallback");
                TemplatePersonalizer::advice(ctx)
            }
        }
    }

    fn status(&self) -> PersonalizerStatus {
        PersonalizerStatus {
            enabled: true,
            model: self.model.clone(),
            require_llm: self.require_llm,
            client_ready: true,
        }
    }
}
