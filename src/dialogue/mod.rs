//! Dialogue: the multi-turn questionnaire state machine.
//!
//! Each inbound event (join, answer, free text) is applied to the user's
//! session under a per-user lock. The controller asks the next question or,
//! once the last one is answered, produces a recommendation and resets the
//! session so the user can start over.

pub mod controller;
pub mod locks;
pub mod state;

pub use controller::{
    AnswerPolicy, DEFAULT_WELCOME_TEXT, DialogueConfig, DialogueController, DialogueOutcome,
    DialogueReply, InboundEvent,
};
pub use locks::UserLocks;
pub use state::DialoguePhase;
