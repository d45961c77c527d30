//! Recommendation generator: turns a completed answer set into a cocktail
//! suggestion, never surfacing a backend error to the caller.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::prompts::{BARTENDER_SYSTEM_PROMPT, FALLBACK_TEXT, recommendation_prompt};
use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, costs};
use crate::questionnaire::QuestionKey;

/// Configuration for recommendation generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Hard limit on one backend call; expiry counts as a failure.
    pub timeout: Duration,
    /// LLM temperature.
    pub temperature: f32,
    /// Max tokens for the LLM response.
    pub max_tokens: u32,
    /// Text returned when generation fails.
    pub fallback_text: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            temperature: 0.7,
            max_tokens: 200,
            fallback_text: FALLBACK_TEXT.to_string(),
        }
    }
}

/// Where a recommendation's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Generated,
    Fallback,
}

/// Text ready to send back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub text: String,
    pub source: Source,
}

impl Recommendation {
    pub fn is_fallback(&self) -> bool {
        self.source == Source::Fallback
    }
}

/// Generates recommendations (and free-text chat replies) through an LLM.
pub struct RecommendationGenerator {
    llm: Arc<dyn LlmProvider>,
    config: GeneratorConfig,
}

impl RecommendationGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: GeneratorConfig) -> Self {
        Self { llm, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Recommend a cocktail for the given ordered answers.
    pub async fn recommend(&self, answers: &[(QuestionKey, String)]) -> Recommendation {
        let prompt = recommendation_prompt(answers);
        info!(fields = answers.len(), "Generating cocktail recommendation");
        self.generate(prompt, "recommendation").await
    }

    /// Forward a free-text message verbatim and return the model's reply.
    /// Stateless and single-turn.
    pub async fn chat(&self, text: &str) -> Recommendation {
        self.generate(text.to_string(), "chat").await
    }

    async fn generate(&self, prompt: String, purpose: &'static str) -> Recommendation {
        match self.call(prompt).await {
            Ok(text) => Recommendation {
                text,
                source: Source::Generated,
            },
            Err(e) => {
                warn!(purpose, error = %e, "Generation failed; using fallback text");
                Recommendation {
                    text: self.config.fallback_text.clone(),
                    source: Source::Fallback,
                }
            }
        }
    }

    async fn call(&self, prompt: String) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(BARTENDER_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ])
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        let response = tokio::time::timeout(self.config.timeout, self.llm.complete(request))
            .await
            .map_err(|_| LlmError::Timeout {
                provider: self.llm.model_name().to_string(),
                timeout: self.config.timeout,
            })??;

        let text = response.content.trim();
        if text.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.llm.model_name().to_string(),
                reason: "empty completion".to_string(),
            });
        }

        let cost = costs::estimate(
            self.llm.cost_per_token(),
            response.input_tokens,
            response.output_tokens,
        );
        info!(
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            cost = %cost,
            "Generation complete"
        );

        Ok(text.to_string())
    }
}
