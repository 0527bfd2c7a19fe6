//! Geoscope API crate - axum HTTP server exposing analysis, chat, and
//! geospatial query endpoints.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
