//! DialogueController: applies inbound events to sessions and decides what
//! to say next.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::locks::UserLocks;
use super::state::DialoguePhase;
use crate::channels::OutboundMessage;
use crate::error::ConfigError;
use crate::questionnaire::{AnswerPayload, Next, QuestionDefinition, QuestionKey, QuestionSequencer};
use crate::recommend::{Recommendation, RecommendationGenerator};
use crate::session::{Session, SessionStore};

/// Default greeting sent on join.
pub const DEFAULT_WELCOME_TEXT: &str =
    "哈囉！歡迎光臨 xx 調酒店！✨\n接下來讓我們為你挑選一款適合的調酒！";

/// How answers that don't match the pending question are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerPolicy {
    /// Only the expected next field with one of its listed values is
    /// accepted; anything else re-asks the pending question.
    #[default]
    Strict,
    /// Any known field is written (overwriting earlier answers) and the
    /// sequence advances from that field.
    Permissive,
}

impl std::str::FromStr for AnswerPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "permissive" => Ok(Self::Permissive),
            other => Err(ConfigError::InvalidValue {
                key: "BOT_ANSWER_POLICY".to_string(),
                message: format!("unknown policy '{other}' (expected strict or permissive)"),
            }),
        }
    }
}

/// Dialogue behavior knobs.
#[derive(Debug, Clone)]
pub struct DialogueConfig {
    pub policy: AnswerPolicy,
    pub welcome_text: String,
    /// Forward free-text messages to the generator as a stateless chat.
    pub free_text_chat: bool,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            policy: AnswerPolicy::Strict,
            welcome_text: DEFAULT_WELCOME_TEXT.to_string(),
            free_text_chat: false,
        }
    }
}

/// A platform-neutral inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// First (or renewed) contact.
    Join { user_id: String },
    /// A choice selection carrying a `key=value` payload.
    Answer { user_id: String, payload: String },
    /// A free-text message.
    Text { user_id: String, text: String },
}

impl InboundEvent {
    pub fn user_id(&self) -> &str {
        match self {
            Self::Join { user_id } | Self::Answer { user_id, .. } | Self::Text { user_id, .. } => {
                user_id
            }
        }
    }
}

/// What an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueOutcome {
    /// Session reset and the first question asked.
    Started { first: QuestionKey },
    /// Answer recorded; the next question asked.
    Asked {
        answered: QuestionKey,
        next: QuestionKey,
    },
    /// Last answer recorded, recommendation produced, session reset.
    Completed { recommendation: Recommendation },
    /// Answer refused under the strict policy; pending question re-asked.
    Rejected {
        received: QuestionKey,
        expected: QuestionKey,
    },
    /// Pending question delivered again on request.
    Resent { pending: QuestionKey },
    /// Free-text chat reply.
    Chatted { reply: Recommendation },
    /// Nothing to do; no messages.
    Ignored { reason: String },
}

/// Outcome plus the messages to deliver for it.
#[derive(Debug, Clone)]
pub struct DialogueReply {
    pub outcome: DialogueOutcome,
    pub messages: Vec<OutboundMessage>,
}

impl DialogueReply {
    fn ignored(reason: impl Into<String>) -> Self {
        Self {
            outcome: DialogueOutcome::Ignored {
                reason: reason.into(),
            },
            messages: Vec::new(),
        }
    }
}

/// Drives every user through the questionnaire.
pub struct DialogueController {
    store: Arc<dyn SessionStore>,
    sequencer: Arc<QuestionSequencer>,
    generator: Arc<RecommendationGenerator>,
    locks: UserLocks,
    config: DialogueConfig,
}

impl DialogueController {
    pub fn new(
        store: Arc<dyn SessionStore>,
        sequencer: Arc<QuestionSequencer>,
        generator: Arc<RecommendationGenerator>,
        config: DialogueConfig,
    ) -> Self {
        Self {
            store,
            sequencer,
            generator,
            locks: UserLocks::new(),
            config,
        }
    }

    pub fn sequencer(&self) -> &QuestionSequencer {
        &self.sequencer
    }

    /// Current phase for a user.
    pub async fn phase(&self, user_id: &str) -> DialoguePhase {
        let session = self.store.get(user_id).await;
        DialoguePhase::of(session.as_ref(), &self.sequencer)
    }

    /// Apply one inbound event.
    pub async fn handle(&self, event: InboundEvent) -> DialogueReply {
        match event {
            InboundEvent::Join { user_id } => self.handle_join(&user_id).await,
            InboundEvent::Answer { user_id, payload } => match AnswerPayload::parse(&payload) {
                Ok(answer) => self.handle_answer(&user_id, answer).await,
                Err(e) => {
                    warn!(user_id = %user_id, payload = %payload, error = %e, "Ignoring unrecognized postback");
                    DialogueReply::ignored(e.to_string())
                }
            },
            InboundEvent::Text { user_id, text } => self.handle_text(&user_id, &text).await,
        }
    }

    /// Join: reset the session, greet, and ask the first question.
    ///
    /// A repeat join discards in-progress answers.
    pub async fn handle_join(&self, user_id: &str) -> DialogueReply {
        let _guard = self.locks.lock(user_id).await;

        let previous = self.store.get(user_id).await;
        if previous.as_ref().is_some_and(|s| !s.is_blank()) {
            info!(user_id = %user_id, "Join restarts an in-progress questionnaire");
        }
        self.store.reset(user_id).await;

        let first = self.sequencer.first();
        info!(user_id = %user_id, question = %first.key, "User joined; asking first question");

        DialogueReply {
            outcome: DialogueOutcome::Started { first: first.key },
            messages: vec![
                OutboundMessage::text(self.config.welcome_text.clone()),
                OutboundMessage::prompt(first),
            ],
        }
    }

    /// Answer: record the value, then ask the next question or finish.
    ///
    /// Users without a session get one lazily, as if they had joined.
    pub async fn handle_answer(&self, user_id: &str, answer: AnswerPayload) -> DialogueReply {
        let _guard = self.locks.lock(user_id).await;

        if !self.sequencer.contains(answer.key) {
            warn!(user_id = %user_id, key = %answer.key, "Answer for a question this questionnaire does not ask");
            return DialogueReply::ignored(format!("question {} is not asked", answer.key));
        }

        let session = self.store.get_or_create(user_id).await;

        if self.config.policy == AnswerPolicy::Strict {
            if let Some(pending) = self.check_strict(&session, &answer).await {
                warn!(
                    user_id = %user_id,
                    received = %answer.key,
                    expected = %pending.key,
                    "Rejecting out-of-order answer; re-asking pending question"
                );
                return DialogueReply {
                    outcome: DialogueOutcome::Rejected {
                        received: answer.key,
                        expected: pending.key,
                    },
                    messages: vec![OutboundMessage::prompt(pending)],
                };
            }
        } else if session.is_answered(answer.key) {
            debug!(user_id = %user_id, key = %answer.key, "Overwriting earlier answer");
        }

        let before = DialoguePhase::of(Some(&session), &self.sequencer);
        let mut session = session;
        session.set_answer(answer.key, answer.value.clone());
        let session = self.store.save(session).await;
        let after = DialoguePhase::of(Some(&session), &self.sequencer);
        info!(user_id = %user_id, key = %answer.key, value = %answer.value, "Answer recorded");

        if before.can_transition_to(after, &self.sequencer) {
            debug!(user_id = %user_id, from = %before, to = %after, "Phase advanced");
        } else {
            info!(user_id = %user_id, from = %before, to = %after, "Phase moved out of sequence");
        }

        match self.sequencer.next_question(answer.key) {
            Some(Next::Ask(next)) => DialogueReply {
                outcome: DialogueOutcome::Asked {
                    answered: answer.key,
                    next: next.key,
                },
                messages: vec![OutboundMessage::prompt(next)],
            },
            Some(Next::Complete) => self.complete(&session).await,
            None => DialogueReply::ignored(format!("question {} is not asked", answer.key)),
        }
    }

    /// Strict-policy check. Returns the pending question when the answer
    /// must be refused.
    async fn check_strict(
        &self,
        session: &Session,
        answer: &AnswerPayload,
    ) -> Option<&QuestionDefinition> {
        match self.sequencer.expected(session) {
            Next::Ask(q) if q.key == answer.key && q.accepts(&answer.value) => None,
            Next::Ask(q) => Some(q),
            Next::Complete => {
                // A fully answered session left behind by another backend;
                // start over.
                self.store.reset(&session.user_id).await;
                Some(self.sequencer.first())
            }
        }
    }

    /// Generate the recommendation and reset, whether generation succeeded
    /// or fell back.
    async fn complete(&self, session: &Session) -> DialogueReply {
        let answers = self.sequencer.ordered_answers(session);
        let recommendation = self.generator.recommend(&answers).await;
        self.store.reset(&session.user_id).await;

        info!(
            user_id = %session.user_id,
            fallback = recommendation.is_fallback(),
            "Questionnaire complete; session reset"
        );

        DialogueReply {
            messages: vec![OutboundMessage::text(recommendation.text.clone())],
            outcome: DialogueOutcome::Completed { recommendation },
        }
    }

    /// Free text: chat when enabled, otherwise re-send the pending question
    /// to users mid-questionnaire.
    pub async fn handle_text(&self, user_id: &str, text: &str) -> DialogueReply {
        if self.config.free_text_chat {
            info!(user_id = %user_id, "Forwarding free-text message to generator");
            let reply = self.generator.chat(text).await;
            return DialogueReply {
                messages: vec![OutboundMessage::text(reply.text.clone())],
                outcome: DialogueOutcome::Chatted { reply },
            };
        }

        let _guard = self.locks.lock(user_id).await;
        let phase = self.phase(user_id).await;
        let pending = match phase {
            DialoguePhase::Awaiting(key) => self.sequencer.question(key),
            DialoguePhase::NotStarted => {
                debug!(user_id = %user_id, "Ignoring free text from user without a session");
                return DialogueReply::ignored("no questionnaire in progress");
            }
            DialoguePhase::Complete => None,
        };
        let Some(pending) = pending else {
            return DialogueReply::ignored("no question pending");
        };

        info!(user_id = %user_id, phase = %phase, "Re-sending pending question");
        DialogueReply {
            outcome: DialogueOutcome::Resent {
                pending: pending.key,
            },
            messages: vec![OutboundMessage::prompt(pending)],
        }
    }
}
