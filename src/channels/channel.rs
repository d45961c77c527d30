//! Outbound message shapes and the `Messenger` trait.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ChannelError;
use crate::questionnaire::{AnswerPayload, QuestionDefinition};

/// One button on a choice prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptChoice {
    pub label: String,
    /// Opaque `key=value` string echoed back in the postback.
    pub payload: String,
}

/// A message the bot wants delivered to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Plain text.
    Text { text: String },
    /// Title + body + labeled buttons.
    ChoicePrompt {
        alt_text: String,
        title: String,
        body: String,
        choices: Vec<PromptChoice>,
    },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Render a question as a choice prompt.
    pub fn prompt(question: &QuestionDefinition) -> Self {
        Self::ChoicePrompt {
            alt_text: question.alt_text.clone(),
            title: question.title.clone(),
            body: question.body.clone(),
            choices: question
                .choices
                .iter()
                .map(|c| PromptChoice {
                    label: c.label.clone(),
                    payload: AnswerPayload::new(question.key, c.value.clone()).encode(),
                })
                .collect(),
        }
    }

    /// The text body, for plain text messages.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::ChoicePrompt { .. } => None,
        }
    }
}

/// Where to deliver messages for one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub user_id: String,
    /// Single-use token tied to the inbound event, when the platform gave one.
    pub reply_token: Option<String>,
}

impl Recipient {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            reply_token: None,
        }
    }

    pub fn with_reply_token(mut self, token: impl Into<String>) -> Self {
        self.reply_token = Some(token.into());
        self
    }
}

/// Delivers outbound messages to a user on a messaging platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Channel name, for logs.
    fn name(&self) -> &str;

    /// Deliver all `messages`, in order, to the recipient.
    async fn deliver(
        &self,
        recipient: &Recipient,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::{QuestionKey, catalog::cocktail_question};

    #[test]
    fn prompt_payloads_encode_key_and_value() {
        let msg = OutboundMessage::prompt(&cocktail_question(QuestionKey::Taste));
        match msg {
            OutboundMessage::ChoicePrompt {
                title, choices, ..
            } => {
                assert_eq!(title, "現在比較想吃什麼？");
                assert_eq!(choices.len(), 4);
                assert_eq!(choices[0].label, "檸檬（酸）");
                assert_eq!(choices[0].payload, "taste=酸");
            }
            other => panic!("expected choice prompt, got {other:?}"),
        }
    }

    #[test]
    fn as_text_only_for_text() {
        assert_eq!(OutboundMessage::text("hi").as_text(), Some("hi"));
        let prompt = OutboundMessage::prompt(&cocktail_question(QuestionKey::Drink));
        assert!(prompt.as_text().is_none());
    }

    #[test]
    fn recipient_builder() {
        let r = Recipient::new("U1").with_reply_token("tok");
        assert_eq!(r.user_id, "U1");
        assert_eq!(r.reply_token.as_deref(), Some("tok"));
    }
}
