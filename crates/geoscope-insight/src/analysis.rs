//! Narrative analysis of places and routes.
//!
//! Analysis runs as a three-tier pipeline and never fails outward:
//!
//! - **Model**: the language model's reply, parsed as the full record.
//! - **Template**: the reply was not a valid record; a canned record is built
//!   from the known fields.
//! - **Heuristic**: the call itself failed (or came back empty); a record is
//!   derived from rating, price level, or numeric distance.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use geoscope_core::config::LlmConfig;
use geoscope_core::types::{
    Difficulty, Place, PlaceAnalysis, Route, RouteAnalysis, ScenicValue, Sentiment,
};

use crate::error::{InsightError, LlmError};
use crate::llm::{ChatCompletionRequest, LanguageModel};
use crate::prompts;

/// Category used when a place has no types.
pub const DEFAULT_CATEGORY: &str = "Lieu";
pub const DEFAULT_PRICE_RANGE: &str = "€€";

/// Which tier produced an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Model,
    Template,
    Heuristic,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Model => "model",
            Tier::Template => "template",
            Tier::Heuristic => "heuristic",
        };
        f.write_str(s)
    }
}

/// An analysis together with the tier that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome<T> {
    pub value: T,
    pub tier: Tier,
}

impl<T> AnalysisOutcome<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Sampling parameters for analysis calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

impl From<&LlmConfig> for AnalysisSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            temperature: config.analysis_temperature,
            max_tokens: config.analysis_max_tokens,
        }
    }
}

/// Produces `PlaceAnalysis` and `RouteAnalysis` records.
pub struct AnalysisEngine {
    model: Arc<dyn LanguageModel>,
    settings: AnalysisSettings,
    distance_noise: Regex,
    leading_number: Regex,
}

impl AnalysisEngine {
    pub fn new(model: Arc<dyn LanguageModel>, settings: AnalysisSettings) -> Self {
        Self {
            model,
            settings,
            distance_noise: Regex::new(r"[^\d.]").unwrap(),
            leading_number: Regex::new(r"^\d*\.?\d*").unwrap(),
        }
    }

    pub async fn analyze_place(&self, place: &Place) -> AnalysisOutcome<PlaceAnalysis> {
        let request = self.request(prompts::PLACE_SYSTEM, prompts::place_prompt(place));
        let outcome = match self.ask::<PlaceAnalysis>(&request).await {
            Ok(value) => AnalysisOutcome {
                value,
                tier: Tier::Model,
            },
            Err(InsightError::Malformed(reason)) => {
                warn!(place = %place.name, reason = %reason, "Malformed place analysis, using template");
                AnalysisOutcome {
                    value: template_place_analysis(place),
                    tier: Tier::Template,
                }
            }
            Err(InsightError::Llm(e)) => {
                warn!(place = %place.name, error = %e, "Place analysis call failed, using heuristics");
                AnalysisOutcome {
                    value: heuristic_place_analysis(place),
                    tier: Tier::Heuristic,
                }
            }
        };
        info!(place = %place.name, tier = %outcome.tier, "Place analyzed");
        outcome
    }

    pub async fn analyze_route(&self, route: &Route) -> AnalysisOutcome<RouteAnalysis> {
        let request = self.request(prompts::ROUTE_SYSTEM, prompts::route_prompt(route));
        let outcome = match self.ask::<RouteAnalysis>(&request).await {
            Ok(value) => AnalysisOutcome {
                value,
                tier: Tier::Model,
            },
            Err(InsightError::Malformed(reason)) => {
                warn!(route = %route.id, reason = %reason, "Malformed route analysis, using template");
                AnalysisOutcome {
                    value: template_route_analysis(route),
                    tier: Tier::Template,
                }
            }
            Err(InsightError::Llm(e)) => {
                warn!(route = %route.id, error = %e, "Route analysis call failed, using heuristics");
                AnalysisOutcome {
                    value: self.heuristic_route_analysis(route),
                    tier: Tier::Heuristic,
                }
            }
        };
        info!(route = %route.id, tier = %outcome.tier, "Route analyzed");
        outcome
    }

    /// Heuristic route record keyed on the numeric part of the distance.
    pub fn heuristic_route_analysis(&self, route: &Route) -> RouteAnalysis {
        let difficulty = match self.distance_number(&route.distance) {
            Some(d) if d > 200.0 => Difficulty::Difficult,
            Some(d) if d > 100.0 => Difficulty::Moderate,
            _ => Difficulty::Easy,
        };

        RouteAnalysis {
            difficulty,
            scenic_value: ScenicValue::Medium,
            traffic_prediction: "Trafic variable selon l'heure et le jour. Consultez les conditions en temps réel.".to_string(),
            alternative_suggestions: strings(&[
                "Vérifiez les options de transport en commun",
                "Considérez les itinéraires secondaires pour éviter les bouchons",
            ]),
            points_of_interest: strings(&[
                "Aires de repos sur autoroute",
                "Stations-service",
                "Points de vue panoramiques",
            ]),
            travel_tips: strings(&[
                "Vérifiez l'état de votre véhicule avant le départ",
                "Emportez de l'eau et des collations",
                "Consultez la météo et les conditions de circulation",
                "Prévoyez des pauses régulières",
            ]),
            summary: format!(
                "Trajet de {} estimé à {}, reliant {} à {} avec {} étapes principales.",
                route.distance,
                route.duration,
                route.origin,
                route.destination,
                route.steps.len()
            ),
        }
    }

    /// Keep digits and dots, then read the leading decimal number.
    fn distance_number(&self, distance: &str) -> Option<f64> {
        let digits = self.distance_noise.replace_all(distance, "");
        self.leading_number
            .find(&digits)
            .and_then(|m| m.as_str().parse::<f64>().ok())
    }

    fn request(&self, system: &str, user: String) -> ChatCompletionRequest {
        ChatCompletionRequest {
            system: system.to_string(),
            user,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }

    async fn ask<T: DeserializeOwned>(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<T, InsightError> {
        let reply = self.model.complete(request).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(LlmError::EmptyCompletion.into());
        }
        Ok(serde_json::from_str(reply)?)
    }
}

// =============================================================================
// Fallback records
// =============================================================================

/// Canned place record used when the model reply cannot be parsed.
pub fn template_place_analysis(place: &Place) -> PlaceAnalysis {
    PlaceAnalysis {
        sentiment: Sentiment::Neutral,
        category: category_of(place),
        highlights: strings(&["Lieu intéressant à visiter"]),
        recommendations: strings(&["Vérifiez les horaires d'ouverture"]),
        price_range: DEFAULT_PRICE_RANGE.to_string(),
        accessibility: "Information non disponible".to_string(),
        best_time_to_visit: "Selon vos préférences".to_string(),
        summary: format!("{} est un lieu situé à {}.", place.name, place.address),
    }
}

/// Place record derived from rating and price level when the model is
/// unreachable. A zero rating counts as no rating.
pub fn heuristic_place_analysis(place: &Place) -> PlaceAnalysis {
    let rating = place.rating.filter(|r| *r > 0.0);
    let sentiment = match rating {
        Some(r) if r >= 4.0 => Sentiment::Positive,
        Some(r) if r < 3.0 => Sentiment::Negative,
        _ => Sentiment::Neutral,
    };
    let price_range = match place.price_level {
        Some(level) if level >= 1 => "€".repeat(level as usize),
        _ => DEFAULT_PRICE_RANGE.to_string(),
    };
    let first_highlight = match rating {
        Some(r) => format!("Note de {}/5", r),
        None => "Lieu à découvrir".to_string(),
    };
    let summary = match rating {
        Some(r) => format!(
            "{} est situé à {}. Il a une note de {}/5.",
            place.name, place.address, r
        ),
        None => format!("{} est situé à {}.", place.name, place.address),
    };

    PlaceAnalysis {
        sentiment,
        category: category_of(place),
        highlights: vec![
            first_highlight,
            "Situé dans un quartier accessible".to_string(),
            "Informations détaillées disponibles".to_string(),
        ],
        recommendations: strings(&[
            "Vérifiez les horaires d'ouverture avant votre visite",
            "Consultez les avis récents",
            "Préparez votre itinéraire à l'avance",
        ]),
        price_range,
        accessibility: "Informations d'accessibilité à vérifier sur place".to_string(),
        best_time_to_visit: "Selon vos préférences et la météo".to_string(),
        summary,
    }
}

/// Canned route record used when the model reply cannot be parsed.
///
/// Difficulty here depends on step count, not distance.
pub fn template_route_analysis(route: &Route) -> RouteAnalysis {
    RouteAnalysis {
        difficulty: if route.steps.len() > 10 {
            Difficulty::Moderate
        } else {
            Difficulty::Easy
        },
        scenic_value: ScenicValue::Medium,
        traffic_prediction: "Trafic variable selon l'heure. Évitez les heures de pointe."
            .to_string(),
        alternative_suggestions: strings(&[
            "Considérez les transports en commun",
            "Vérifiez les itinéraires alternatifs",
        ]),
        points_of_interest: strings(&["Aires de repos", "Stations-service", "Points de vue"]),
        travel_tips: strings(&[
            "Préparez votre véhicule avant le départ",
            "Gardez de l'eau et des collations",
            "Vérifiez la météo",
        ]),
        summary: format!(
            "Itinéraire de {} en {} de {} vers {}.",
            route.distance, route.duration, route.origin, route.destination
        ),
    }
}

fn category_of(place: &Place) -> String {
    place
        .types
        .first()
        .filter(|t| !t.is_empty())
        .cloned()
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
