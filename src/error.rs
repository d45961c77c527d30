//! Error types for the bartender bot.

use std::time::Duration;

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Dialogue error: {0}")]
    Dialogue(#[from] DialogueError),

    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound messaging errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Channel {name} rejected request with status {status}: {body}")]
    Rejected {
        name: String,
        status: u16,
        body: String,
    },

    #[error("No delivery route for user {user_id} on channel {name}")]
    NoRoute { name: String, user_id: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout {
        provider: String,
        timeout: Duration,
    },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },
}

/// Session store errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No session exists for user {user_id}")]
    UnknownUser { user_id: String },
}

/// Questionnaire and dialogue errors.
#[derive(Debug, thiserror::Error)]
pub enum DialogueError {
    #[error("Questionnaire must contain at least one question")]
    EmptyQuestionnaire,

    #[error("Question {key} appears more than once")]
    DuplicateQuestion { key: String },

    #[error("Question {key} has no choices")]
    NoChoices { key: String },

    #[error("Unsupported questionnaire length {0} (expected 3, 4 or 5)")]
    UnsupportedVariant(usize),

    #[error("Malformed answer payload {payload:?}: {reason}")]
    MalformedPayload { payload: String, reason: String },

    #[error("Unknown question key: {0}")]
    UnknownQuestion(String),
}

/// Inbound webhook errors. All of them map to a 400 response.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Missing signature header")]
    MissingSignature,

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Invalid webhook body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
