use thiserror::Error;

/// Failures of a language-model call.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("missing API key")]
    MissingKey,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("empty completion")]
    EmptyCompletion,
    #[error("config error: {0}")]
    Config(String),
}

/// Errors raised inside the analysis pipeline before a fallback tier absorbs
/// them.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),
    #[error("malformed model output: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for InsightError {
    fn from(err: serde_json::Error) -> Self {
        InsightError::Malformed(err.to_string())
    }
}
