//! LINE channel: delivers messages through the Messaging API.
//!
//! Replies use the event's single-use reply token; when there is no token or
//! the reply call fails, the same messages are pushed by user id instead.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::channels::{Messenger, OutboundMessage, Recipient};
use crate::error::ChannelError;

/// Default Messaging API base URL.
pub const LINE_API_BASE: &str = "https://api.line.me/v2/bot";

/// Maximum messages per reply/push call.
const MAX_MESSAGES_PER_REQUEST: usize = 5;

/// Maximum characters in a text message.
const LINE_MAX_TEXT_LENGTH: usize = 5000;

/// Buttons-template limits.
const MAX_TITLE_CHARS: usize = 40;
const MAX_BODY_CHARS: usize = 60;
const MAX_LABEL_CHARS: usize = 20;
const MAX_ACTIONS: usize = 4;

/// LINE credentials and endpoint.
#[derive(Debug, Clone)]
pub struct LineConfig {
    pub access_token: SecretString,
    pub channel_secret: SecretString,
    pub api_base: String,
}

/// LINE Messaging API client.
pub struct LineMessenger {
    access_token: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl LineMessenger {
    pub fn new(config: &LineConfig) -> Self {
        Self {
            access_token: config.access_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<(), ChannelError> {
        let resp = self
            .client
            .post(self.api_url(path))
            .bearer_auth(self.access_token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "line".into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChannelError::Rejected {
                name: "line".into(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    /// Reply with the event's reply token (at most five messages).
    async fn reply(&self, reply_token: &str, messages: &[Value]) -> Result<(), ChannelError> {
        let body = json!({
            "replyToken": reply_token,
            "messages": messages,
        });
        self.post("message/reply", &body).await
    }

    /// Push to a user id, five messages per call.
    async fn push(&self, user_id: &str, messages: &[Value]) -> Result<(), ChannelError> {
        for batch in messages.chunks(MAX_MESSAGES_PER_REQUEST) {
            let body = json!({
                "to": user_id,
                "messages": batch,
            });
            self.post("message/push", &body).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for LineMessenger {
    fn name(&self) -> &str {
        "line"
    }

    async fn deliver(
        &self,
        recipient: &Recipient,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), ChannelError> {
        let payload: Vec<Value> = messages.iter().flat_map(to_line_messages).collect();
        if payload.is_empty() {
            return Ok(());
        }

        if let Some(token) = recipient.reply_token.as_deref() {
            if payload.len() <= MAX_MESSAGES_PER_REQUEST {
                match self.reply(token, &payload).await {
                    Ok(()) => {
                        debug!(user_id = %recipient.user_id, count = payload.len(), "LINE reply sent");
                        return Ok(());
                    }
                    Err(e) => {
                        warn!(
                            user_id = %recipient.user_id,
                            error = %e,
                            "LINE reply failed; retrying as push"
                        );
                    }
                }
            }
        }

        self.push(&recipient.user_id, &payload).await?;
        info!(user_id = %recipient.user_id, count = payload.len(), "LINE push sent");
        Ok(())
    }
}

/// Render one outbound message as LINE message objects. Long text becomes
/// several text messages.
fn to_line_messages(message: &OutboundMessage) -> Vec<Value> {
    match message {
        OutboundMessage::Text { text } => split_message(text, LINE_MAX_TEXT_LENGTH)
            .into_iter()
            .map(|chunk| json!({"type": "text", "text": chunk}))
            .collect(),
        OutboundMessage::ChoicePrompt {
            alt_text,
            title,
            body,
            choices,
        } => {
            let actions: Vec<Value> = choices
                .iter()
                .take(MAX_ACTIONS)
                .map(|c| {
                    json!({
                        "type": "postback",
                        "label": truncate_chars(&c.label, MAX_LABEL_CHARS),
                        "data": c.payload,
                    })
                })
                .collect();
            vec![json!({
                "type": "template",
                "altText": alt_text,
                "template": {
                    "type": "buttons",
                    "title": truncate_chars(title, MAX_TITLE_CHARS),
                    "text": truncate_chars(body, MAX_BODY_CHARS),
                    "actions": actions,
                }
            })]
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Split text into chunks of at most `max_chars` characters, preferring
/// newline then space boundaries.
fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let limit = match remaining.char_indices().nth(max_chars) {
            Some((idx, _)) => idx,
            None => {
                chunks.push(remaining.to_string());
                break;
            }
        };

        let chunk = &remaining[..limit];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(limit);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { limit } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::{QuestionKey, catalog::cocktail_question};
    use axum::extract::State;
    use axum::http::{StatusCode, Uri};
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    fn messenger() -> LineMessenger {
        messenger_at("https://api.line.me/v2/bot/".to_string())
    }

    #[test]
    fn line_channel_name() {
        assert_eq!(messenger().name(), "line");
    }

    #[test]
    fn line_api_url_trims_trailing_slash() {
        assert_eq!(
            messenger().api_url("message/reply"),
            "https://api.line.me/v2/bot/message/reply"
        );
    }

    #[test]
    fn text_message_json() {
        let msgs = to_line_messages(&OutboundMessage::text("乾杯"));
        assert_eq!(msgs, vec![json!({"type": "text", "text": "乾杯"})]);
    }

    #[test]
    fn choice_prompt_becomes_buttons_template() {
        let prompt = OutboundMessage::prompt(&cocktail_question(QuestionKey::Drink));
        let msgs = to_line_messages(&prompt);
        assert_eq!(msgs.len(), 1);

        let m = &msgs[0];
        assert_eq!(m["type"], "template");
        assert_eq!(m["altText"], "選擇酒類");
        assert_eq!(m["template"]["type"], "buttons");
        assert_eq!(m["template"]["title"], "今天想喝什麼酒？");
        assert_eq!(m["template"]["text"], "選擇一種酒類");

        let actions = m["template"]["actions"].as_array().unwrap();
        assert_eq!(actions.len(), 4);
        assert_eq!(actions[0]["type"], "postback");
        assert_eq!(actions[0]["label"], "威士忌");
        assert_eq!(actions[0]["data"], "drink=威士忌");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("需要鼓勵需要鼓勵", 4), "需要鼓勵");
        assert_eq!(truncate_chars("short", 20), "short");
    }

    #[test]
    fn split_message_short() {
        let chunks = split_message("Hello", 5000);
        assert_eq!(chunks, vec!["Hello"]);
    }

    #[test]
    fn split_message_over_limit_on_newline() {
        let msg = format!("{}\n{}", "a".repeat(20), "b".repeat(30));
        let chunks = split_message(&msg, 40);
        assert_eq!(chunks, vec!["a".repeat(20), "b".repeat(30)]);
    }

    #[test]
    fn split_message_multibyte_without_split_point() {
        let msg = "酒".repeat(50);
        let chunks = split_message(&msg, 40);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 40);
        assert_eq!(chunks[1].chars().count(), 10);
    }

    /// Minimal stand-in for the Messaging API that records each call.
    async fn fake_api() -> (String, Arc<Mutex<Vec<(String, Value)>>>) {
        let calls: Arc<Mutex<Vec<(String, Value)>>> = Arc::default();

        async fn record(
            State(calls): State<Arc<Mutex<Vec<(String, Value)>>>>,
            uri: Uri,
            Json(body): Json<Value>,
        ) -> StatusCode {
            calls.lock().await.push((uri.path().to_string(), body));
            StatusCode::OK
        }

        let app = Router::new()
            .route("/message/reply", post(record))
            .route("/message/push", post(record))
            .with_state(Arc::clone(&calls));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://127.0.0.1:{port}"), calls)
    }

    fn messenger_at(api_base: String) -> LineMessenger {
        LineMessenger::new(&LineConfig {
            access_token: SecretString::from("token".to_string()),
            channel_secret: SecretString::from("secret".to_string()),
            api_base,
        })
    }

    #[tokio::test]
    async fn more_than_five_messages_are_pushed_in_batches() {
        let (base, calls) = fake_api().await;
        let line = messenger_at(base);
        let messages: Vec<_> = (0..7).map(|i| OutboundMessage::text(format!("第{i}杯"))).collect();

        line.deliver(&Recipient::new("U1").with_reply_token("tok"), messages)
            .await
            .unwrap();

        let calls = calls.lock().await;
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(path, _)| path == "/message/push"));
        assert_eq!(calls[0].1["to"], "U1");
        assert_eq!(calls[0].1["messages"].as_array().unwrap().len(), 5);
        assert_eq!(calls[1].1["messages"].as_array().unwrap().len(), 2);
        assert_eq!(calls[1].1["messages"][1]["text"], "第6杯");
    }

    #[tokio::test]
    async fn up_to_five_messages_use_reply_token() {
        let (base, calls) = fake_api().await;
        let line = messenger_at(base);
        let messages = vec![OutboundMessage::text("a"), OutboundMessage::text("b")];

        line.deliver(&Recipient::new("U1").with_reply_token("tok"), messages)
            .await
            .unwrap();

        let calls = calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "/message/reply");
        assert_eq!(calls[0].1["replyToken"], "tok");
    }
}
