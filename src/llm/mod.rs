//! Recommendation model backends.
//!
//! The bartender talks to OpenAI by default or to Anthropic when
//! `BOT_LLM_BACKEND=anthropic`. Either client is wrapped in a `RigAdapter` so
//! the generator only sees `LlmProvider`.

pub mod costs;
pub mod provider;
mod rig_adapter;

pub use provider::*;
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::error::{ConfigError, LlmError};

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmBackend {
    #[default]
    OpenAi,
    Anthropic,
}

impl LlmBackend {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Environment variable holding this backend's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-3.5-turbo",
            Self::Anthropic => "claude-3-5-haiku-latest",
        }
    }
}

impl std::str::FromStr for LlmBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(ConfigError::InvalidValue {
                key: "BOT_LLM_BACKEND".to_string(),
                message: format!("unknown backend '{other}' (expected openai or anthropic)"),
            }),
        }
    }
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// Build the provider for the configured backend and model.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::{anthropic, openai};

    let api_key = config.api_key.expose_secret();
    let name = config.backend.name();
    let provider: Arc<dyn LlmProvider> = match config.backend {
        LlmBackend::OpenAi => {
            let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
                openai::Client::new(api_key).map_err(|e| client_error(name, e))?;
            Arc::new(RigAdapter::new(
                client.completion_model(&config.model),
                &config.model,
                name,
            ))
        }
        LlmBackend::Anthropic => {
            let client: rig::client::Client<anthropic::client::AnthropicExt> =
                anthropic::Client::new(api_key).map_err(|e| client_error(name, e))?;
            Arc::new(RigAdapter::new(
                client.completion_model(&config.model),
                &config.model,
                name,
            ))
        }
    };

    tracing::info!(backend = name, model = %config.model, "Recommendation model ready");
    Ok(provider)
}

fn client_error(provider: &str, e: impl std::fmt::Display) -> LlmError {
    LlmError::RequestFailed {
        provider: provider.to_string(),
        reason: format!("could not build client: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_provider_reports_configured_model() {
        // Keys are only checked when a request is sent.
        let config = LlmConfig {
            backend: LlmBackend::OpenAi,
            api_key: secrecy::SecretString::from("sk-test".to_string()),
            model: "gpt-3.5-turbo".to_string(),
        };
        let provider = create_provider(&config);
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().model_name(), "gpt-3.5-turbo");
    }

    #[test]
    fn anthropic_provider_reports_configured_model() {
        let config = LlmConfig {
            backend: LlmBackend::Anthropic,
            api_key: secrecy::SecretString::from("test-key".to_string()),
            model: "claude-3-5-haiku-latest".to_string(),
        };
        let provider = create_provider(&config);
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().model_name(), "claude-3-5-haiku-latest");
    }

    #[test]
    fn backend_names_and_key_vars() {
        assert_eq!(LlmBackend::OpenAi.name(), "openai");
        assert_eq!(LlmBackend::Anthropic.api_key_var(), "ANTHROPIC_API_KEY");
        assert_eq!(LlmBackend::default(), LlmBackend::OpenAi);
    }

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<LlmBackend>().unwrap(), LlmBackend::OpenAi);
        assert_eq!(
            " anthropic ".parse::<LlmBackend>().unwrap(),
            LlmBackend::Anthropic
        );
        assert!("gemini".parse::<LlmBackend>().is_err());
    }
}
