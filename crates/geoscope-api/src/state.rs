//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use geoscope_core::config::GeoscopeConfig;
use geoscope_insight::{AnalysisEngine, ConversationAssistant};
use geoscope_maps::GeoQueryClient;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. The three
/// components are independent; handlers compose them.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GeoscopeConfig>,
    pub geo: Arc<GeoQueryClient>,
    pub analysis: Arc<AnalysisEngine>,
    pub assistant: Arc<ConversationAssistant>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: GeoscopeConfig,
        geo: GeoQueryClient,
        analysis: AnalysisEngine,
        assistant: ConversationAssistant,
    ) -> Self {
        Self {
            config: Arc::new(config),
            geo: Arc::new(geo),
            analysis: Arc::new(analysis),
            assistant: Arc::new(assistant),
            start_time: Instant::now(),
        }
    }
}
