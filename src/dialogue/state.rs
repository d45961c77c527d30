//! Dialogue state machine: which question a user is waiting on.

use serde::{Deserialize, Serialize};

use crate::questionnaire::{Next, QuestionKey, QuestionSequencer};
use crate::session::Session;

/// The phases of one questionnaire pass.
///
/// Progresses linearly: NotStarted → Awaiting(first) → … → Awaiting(last) →
/// Complete → Awaiting(first). `Complete` is transient: the controller resets
/// the session as soon as the recommendation is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "question", rename_all = "snake_case")]
pub enum DialoguePhase {
    NotStarted,
    Awaiting(QuestionKey),
    Complete,
}

impl DialoguePhase {
    /// Derive the phase from a (possibly missing) session.
    pub fn of(session: Option<&Session>, sequencer: &QuestionSequencer) -> Self {
        match session {
            None => Self::NotStarted,
            Some(s) => match sequencer.expected(s) {
                Next::Ask(q) => Self::Awaiting(q.key),
                Next::Complete => Self::Complete,
            },
        }
    }

    /// Get the next phase in the linear progression, if any.
    pub fn next(&self, sequencer: &QuestionSequencer) -> Option<DialoguePhase> {
        match self {
            Self::NotStarted | Self::Complete => Some(Self::Awaiting(sequencer.first().key)),
            Self::Awaiting(key) => match sequencer.next_question(*key)? {
                Next::Ask(q) => Some(Self::Awaiting(q.key)),
                Next::Complete => Some(Self::Complete),
            },
        }
    }

    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: DialoguePhase, sequencer: &QuestionSequencer) -> bool {
        self.next(sequencer) == Some(target)
    }

    /// Whether every question has been answered.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl Default for DialoguePhase {
    fn default() -> Self {
        Self::NotStarted
    }
}

impl std::fmt::Display for DialoguePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Awaiting(key) => write!(f, "awaiting_{key}"),
            Self::Complete => write!(f, "complete"),
        }
    }
}
