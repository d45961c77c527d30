//! Bartender Bot: a LINE cocktail questionnaire with LLM recommendations.

pub mod channels;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod llm;
pub mod questionnaire;
pub mod recommend;
pub mod session;
