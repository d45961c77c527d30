//! Questionnaire: the ordered question set and its transition table.
//!
//! Questions are static and loaded once at startup. The sequencer decides
//! what comes after a given answer; it never mutates the question list.

pub mod catalog;
pub mod payload;
pub mod question;
pub mod sequencer;

pub use catalog::Variant;
pub use payload::AnswerPayload;
pub use question::{Choice, QuestionDefinition, QuestionKey};
pub use sequencer::{Next, QuestionSequencer};
