//! Recommendation generation: prompt construction, bounded LLM call, and the
//! fallback contract.

pub mod generator;
pub mod prompts;

pub use generator::{GeneratorConfig, Recommendation, RecommendationGenerator, Source};
