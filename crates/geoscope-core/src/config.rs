use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GeoscopeError, Result};
use crate::types::LatLng;

/// Environment variable holding the geospatial provider key.
pub const MAPS_API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";
/// Environment variable holding the language-model provider key.
pub const LLM_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Top-level configuration for Geoscope.
///
/// Loaded from `~/.geoscope/config.toml` by default. Provider keys are
/// usually left out of the file and supplied through the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoscopeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub maps: MapsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl GeoscopeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GeoscopeConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| GeoscopeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Override provider keys from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Override provider keys using `lookup`. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(MAPS_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.maps.api_key = key;
        }
        if let Some(key) = lookup(LLM_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = key;
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed by CORS.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Geospatial provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    pub api_key: String,
    /// Base URL of the Maps web services.
    pub api_base: String,
    /// Base URL of the device geolocation service.
    pub geolocation_base: String,
    /// Language code sent with every provider request.
    pub language: String,
    /// Location bias radius for text search, in meters.
    pub search_radius_m: u32,
    /// Zoom level of a freshly initialized map.
    pub default_zoom: u8,
    /// Zoom level applied when panning to a location.
    pub focus_zoom: u8,
    /// Upper bound on device location acquisition.
    pub location_timeout_secs: u64,
    /// Location used whenever acquisition fails.
    pub default_location: LatLng,
    /// Width requested for resolved photo URLs.
    pub photo_max_width: u32,
    /// Origin pattern quoted in the session diagnostic.
    pub allowed_referrer: String,
    pub request_timeout_secs: u64,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://maps.googleapis.com/maps/api".to_string(),
            geolocation_base: "https://www.googleapis.com/geolocation/v1".to_string(),
            language: "fr".to_string(),
            search_radius_m: 5000,
            default_zoom: 13,
            focus_zoom: 15,
            location_timeout_secs: 10,
            default_location: LatLng::new(48.8566, 2.3522),
            photo_max_width: 400,
            allowed_referrer: "http://localhost:3000/*".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Language-model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: String,
    /// Base URL of an OpenAI-compatible API.
    pub api_base: String,
    pub model: String,
    pub analysis_temperature: f32,
    pub analysis_max_tokens: u32,
    pub chat_temperature: f32,
    pub chat_max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            analysis_temperature: 0.7,
            analysis_max_tokens: 800,
            chat_temperature: 0.8,
            chat_max_tokens: 500,
            request_timeout_secs: 60,
        }
    }
}
