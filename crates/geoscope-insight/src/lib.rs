//! Narrative layer for Geoscope: place and route analysis, and the
//! conversational assistant.
//!
//! Both components sit on a `LanguageModel` and absorb every model failure
//! into deterministic fallback text.

pub mod analysis;
pub mod assistant;
pub mod error;
pub mod llm;
pub mod prompts;

pub use analysis::{AnalysisEngine, AnalysisOutcome, AnalysisSettings, Tier};
pub use assistant::ConversationAssistant;
pub use error::{InsightError, LlmError};
pub use llm::{ChatCompletionRequest, LanguageModel, OpenAiClient};
