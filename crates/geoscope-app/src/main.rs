//! Geoscope application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Overlay provider keys, then flags and `GEOSCOPE_*` variables
//! 3. Build the Google Maps and OpenAI clients
//! 4. Start the axum REST API server

mod cli;

use std::sync::Arc;

use clap::Parser;

use geoscope_api::routes;
use geoscope_api::state::AppState;
use geoscope_core::config::GeoscopeConfig;
use geoscope_insight::{
    AnalysisEngine, AnalysisSettings, ConversationAssistant, LanguageModel, OpenAiClient,
};
use geoscope_maps::{ClientSettings, GeoQueryClient, GoogleMapsClient};

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.config_path();
    let mut config = GeoscopeConfig::load_or_default(&config_file);
    config.apply_env();
    args.apply(&mut config);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Geoscope v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    if config.maps.api_key.is_empty() {
        tracing::warn!("No Google Maps API key configured; map sessions and queries will fail");
    }
    if config.llm.api_key.is_empty() {
        tracing::warn!("No OpenAI API key configured; analyses will use fallback heuristics");
    }

    // Geospatial client. One Google client serves as both provider and
    // location source.
    let google = Arc::new(GoogleMapsClient::new(&config.maps)?);
    let geo = GeoQueryClient::new(
        google.clone(),
        google,
        ClientSettings::from(&config.maps),
    );

    // Narrative components share one model client.
    let openai = OpenAiClient::new(&config.llm)?;
    tracing::info!(model = %openai.model(), "Language model client ready");
    let model: Arc<dyn LanguageModel> = Arc::new(openai);
    let analysis = AnalysisEngine::new(Arc::clone(&model), AnalysisSettings::from(&config.llm));
    let assistant = ConversationAssistant::new(model, &config.llm);

    let state = AppState::new(config.clone(), geo, analysis, assistant);
    routes::start_server(&config, state).await?;

    Ok(())
}
