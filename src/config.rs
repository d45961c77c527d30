//! Configuration types, read from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::channels::{LINE_API_BASE, LineConfig};
use crate::dialogue::{AnswerPolicy, DEFAULT_WELCOME_TEXT, DialogueConfig};
use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};
use crate::questionnaire::Variant;
use crate::recommend::GeneratorConfig;

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Session lifetime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Idle time after which a session is evicted.
    pub ttl: Duration,
    /// How often the eviction sweep runs.
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl SessionConfig {
    /// TTL as a chrono duration, for comparing against session timestamps.
    pub fn ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX)
    }
}

/// Full bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub server: ServerConfig,
    pub line: LineConfig,
    pub llm: LlmConfig,
    pub dialogue: DialogueConfig,
    pub generator: GeneratorConfig,
    pub session: SessionConfig,
    pub variant: Variant,
    /// Directory for rolling log files. Stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl BotConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let line = LineConfig {
            access_token: SecretString::from(require("CHANNEL_ACCESS_TOKEN")?),
            channel_secret: SecretString::from(require("CHANNEL_SECRET")?),
            api_base: get("LINE_API_BASE").unwrap_or_else(|| LINE_API_BASE.to_string()),
        };

        let backend: LlmBackend = match get("BOT_LLM_BACKEND") {
            Some(v) => v.parse()?,
            None => LlmBackend::default(),
        };
        let llm = LlmConfig {
            backend,
            api_key: SecretString::from(require(backend.api_key_var())?),
            model: get("BOT_MODEL").unwrap_or_else(|| backend.default_model().to_string()),
        };

        let server = ServerConfig {
            host: get("BOT_HOST").unwrap_or_else(|| ServerConfig::default().host),
            port: parse_or(&get, "PORT", 5000)?,
        };

        let count: usize = parse_or(&get, "BOT_QUESTION_COUNT", Variant::default().len())?;
        let variant = Variant::from_len(count).map_err(|e| ConfigError::InvalidValue {
            key: "BOT_QUESTION_COUNT".to_string(),
            message: e.to_string(),
        })?;

        let policy: AnswerPolicy = match get("BOT_ANSWER_POLICY") {
            Some(v) => v.parse()?,
            None => AnswerPolicy::default(),
        };
        let dialogue = DialogueConfig {
            policy,
            welcome_text: get("BOT_WELCOME_TEXT").unwrap_or_else(|| DEFAULT_WELCOME_TEXT.to_string()),
            free_text_chat: parse_bool(&get, "BOT_FREE_TEXT_CHAT", false)?,
        };

        let timeout_secs: u64 = parse_or(&get, "BOT_GENERATOR_TIMEOUT_SECS", 10)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "BOT_GENERATOR_TIMEOUT_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        let generator = GeneratorConfig {
            timeout: Duration::from_secs(timeout_secs),
            ..Default::default()
        };

        let ttl_min: u64 = parse_or(&get, "BOT_SESSION_TTL_MIN", 30)?;
        if ttl_min == 0 {
            return Err(ConfigError::InvalidValue {
                key: "BOT_SESSION_TTL_MIN".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        let ttl_secs = ttl_min
            .checked_mul(60)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "BOT_SESSION_TTL_MIN".to_string(),
                message: format!("{ttl_min} minutes is too large"),
            })?;
        let session = SessionConfig {
            ttl: Duration::from_secs(ttl_secs),
            ..Default::default()
        };

        Ok(Self {
            server,
            line,
            llm,
            dialogue,
            generator,
            session,
            variant,
            log_dir: get("BOT_LOG_DIR").map(PathBuf::from),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}': {e}"),
        }),
        None => Ok(default),
    }
}

fn parse_bool<G>(get: &G, key: &str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{v}' is not a boolean"),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("CHANNEL_ACCESS_TOKEN", "token"),
        ("CHANNEL_SECRET", "secret"),
        ("OPENAI_API_KEY", "sk-test"),
    ];

    fn with_required(extra: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend_from_slice(extra);
        env(&pairs)
    }

    #[test]
    fn defaults_with_only_required_vars() {
        let config = BotConfig::from_lookup(with_required(&[])).unwrap();

        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.server.bind_addr(), "0.0.0.0:5000");
        assert_eq!(config.line.access_token.expose_secret(), "token");
        assert_eq!(config.line.channel_secret.expose_secret(), "secret");
        assert_eq!(config.line.api_base, LINE_API_BASE);
        assert_eq!(config.llm.backend, LlmBackend::OpenAi);
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.variant, Variant::Five);
        assert_eq!(config.dialogue.policy, AnswerPolicy::Strict);
        assert_eq!(config.dialogue.welcome_text, DEFAULT_WELCOME_TEXT);
        assert!(!config.dialogue.free_text_chat);
        assert_eq!(config.generator.timeout, Duration::from_secs(10));
        assert_eq!(config.session.ttl, Duration::from_secs(1800));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn missing_secret_is_reported_by_name() {
        let err = BotConfig::from_lookup(env(&[
            ("CHANNEL_ACCESS_TOKEN", "token"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "CHANNEL_SECRET"));
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let err = BotConfig::from_lookup(env(&[
            ("CHANNEL_ACCESS_TOKEN", "  "),
            ("CHANNEL_SECRET", "secret"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "CHANNEL_ACCESS_TOKEN"));
    }

    #[test]
    fn anthropic_backend_needs_its_own_key() {
        let err = BotConfig::from_lookup(with_required(&[("BOT_LLM_BACKEND", "anthropic")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "ANTHROPIC_API_KEY"));

        let config = BotConfig::from_lookup(with_required(&[
            ("BOT_LLM_BACKEND", "anthropic"),
            ("ANTHROPIC_API_KEY", "ak"),
        ]))
        .unwrap();
        assert_eq!(config.llm.backend, LlmBackend::Anthropic);
        assert_eq!(config.llm.model, "claude-3-5-haiku-latest");
    }

    #[test]
    fn overrides_are_applied() {
        let config = BotConfig::from_lookup(with_required(&[
            ("PORT", "8080"),
            ("BOT_HOST", "127.0.0.1"),
            ("BOT_MODEL", "gpt-4o-mini"),
            ("BOT_QUESTION_COUNT", "3"),
            ("BOT_ANSWER_POLICY", "permissive"),
            ("BOT_FREE_TEXT_CHAT", "true"),
            ("BOT_GENERATOR_TIMEOUT_SECS", "4"),
            ("BOT_SESSION_TTL_MIN", "5"),
            ("BOT_WELCOME_TEXT", "歡迎"),
            ("BOT_LOG_DIR", "/tmp/bot-logs"),
            ("LINE_API_BASE", "http://127.0.0.1:9999"),
        ]))
        .unwrap();

        assert_eq!(config.server.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.variant, Variant::Three);
        assert_eq!(config.dialogue.policy, AnswerPolicy::Permissive);
        assert!(config.dialogue.free_text_chat);
        assert_eq!(config.dialogue.welcome_text, "歡迎");
        assert_eq!(config.generator.timeout, Duration::from_secs(4));
        assert_eq!(config.session.ttl, Duration::from_secs(300));
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/bot-logs")));
        assert_eq!(config.line.api_base, "http://127.0.0.1:9999");
    }

    #[test]
    fn invalid_values_are_rejected() {
        for (key, value) in [
            ("PORT", "not-a-port"),
            ("BOT_QUESTION_COUNT", "7"),
            ("BOT_ANSWER_POLICY", "lenient"),
            ("BOT_FREE_TEXT_CHAT", "maybe"),
            ("BOT_GENERATOR_TIMEOUT_SECS", "0"),
            ("BOT_SESSION_TTL_MIN", "-1"),
            ("BOT_SESSION_TTL_MIN", "18446744073709551615"),
            ("BOT_LLM_BACKEND", "gemini"),
        ] {
            let err = BotConfig::from_lookup(with_required(&[(key, value)])).unwrap_err();
            match err {
                ConfigError::InvalidValue { key: k, .. } => assert_eq!(k, key),
                other => panic!("{key}={value}: expected InvalidValue, got {other:?}"),
            }
        }
    }

    #[test]
    fn ttl_converts_to_chrono() {
        let session = SessionConfig::default();
        assert_eq!(session.ttl_chrono(), chrono::Duration::minutes(30));
    }
}
