use thiserror::Error;
use uuid::Uuid;

use crate::types::ProviderStatus;

/// Top-level error type for Geoscope.
///
/// `InvalidInput` and `Provider` are what callers of the geospatial client
/// see; the narrative components convert everything into fallback values
/// and never return this type outward.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeoscopeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Provider error ({context}): {status}")]
    Provider {
        context: String,
        status: ProviderStatus,
    },

    #[error("A map session is already active: {0}")]
    SessionActive(Uuid),

    #[error("Map session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GeoscopeError {
    pub fn provider(context: impl Into<String>, status: ProviderStatus) -> Self {
        GeoscopeError::Provider {
            context: context.into(),
            status,
        }
    }
}

impl From<toml::de::Error> for GeoscopeError {
    fn from(err: toml::de::Error) -> Self {
        GeoscopeError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for GeoscopeError {
    fn from(err: toml::ser::Error) -> Self {
        GeoscopeError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for GeoscopeError {
    fn from(err: serde_json::Error) -> Self {
        GeoscopeError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Geoscope operations.
pub type Result<T> = std::result::Result<T, GeoscopeError>;
