//! Answer payload codec: the `key=value` string carried by choice buttons.

use super::question::QuestionKey;
use crate::error::DialogueError;

/// A decoded answer selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerPayload {
    pub key: QuestionKey,
    pub value: String,
}

impl AnswerPayload {
    pub fn new(key: QuestionKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    /// Parse `key=value`. The split happens at the first `=`, so values may
    /// themselves contain `=`.
    pub fn parse(payload: &str) -> Result<Self, DialogueError> {
        let (key, value) = payload
            .split_once('=')
            .ok_or_else(|| DialogueError::MalformedPayload {
                payload: payload.to_string(),
                reason: "expected key=value".to_string(),
            })?;

        let key: QuestionKey = key.trim().parse()?;
        if value.is_empty() {
            return Err(DialogueError::MalformedPayload {
                payload: payload.to_string(),
                reason: "empty value".to_string(),
            });
        }

        Ok(Self {
            key,
            value: value.to_string(),
        })
    }

    pub fn encode(&self) -> String {
        format!("{}={}", self.key, self.value)
    }
}
