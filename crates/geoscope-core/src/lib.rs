//! Shared domain types, error taxonomy, and configuration for Geoscope.

pub mod config;
pub mod error;
pub mod types;

pub use config::GeoscopeConfig;
pub use error::{GeoscopeError, Result};
pub use types::*;
