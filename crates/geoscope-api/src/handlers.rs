//! Route handler functions for all API endpoints.
//!
//! Bodies are read as raw JSON values first so that a missing or
//! wrong-typed field yields a 400 with a French message rather than the
//! extractor's default rejection.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use geoscope_core::types::{LatLng, Place, PlaceAnalysis, Route, RouteAnalysis};

use crate::error::ApiError;
use crate::state::AppState;

const PLACE_MISSING: &str = "Lieu manquant dans la requête";
const ROUTE_MISSING: &str = "Itinéraire manquant dans la requête";
const MESSAGE_INVALID: &str = "Message manquant ou invalide";
const CONTEXT_INVALID: &str = "Contexte de conversation invalide";
const INVALID_JSON: &str = "Corps de requête JSON invalide";

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub origin: String,
    pub destination: String,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceAnalysisResponse {
    pub success: bool,
    pub analysis: PlaceAnalysis,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RouteAnalysisResponse {
    pub success: bool,
    pub analysis: RouteAnalysis,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub places: Vec<Place>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceResponse {
    pub success: bool,
    pub place: Place,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RouteResponse {
    pub success: bool,
    pub route: Route,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationResponse {
    pub success: bool,
    pub location: LatLng,
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Analysis and chat
// =============================================================================

/// POST /api/maps/analyze-place
pub async fn analyze_place(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PlaceAnalysisResponse>, ApiError> {
    let body = parse_body(&body)?;
    let place: Place = required_field(&body, "place", PLACE_MISSING)?;

    let outcome = state.analysis.analyze_place(&place).await;
    info!(place = %place.name, tier = %outcome.tier, "analyze-place served");
    Ok(Json(PlaceAnalysisResponse {
        success: true,
        analysis: outcome.into_inner(),
    }))
}

/// POST /api/maps/analyze-route
pub async fn analyze_route(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RouteAnalysisResponse>, ApiError> {
    let body = parse_body(&body)?;
    let route: Route = required_field(&body, "route", ROUTE_MISSING)?;

    let outcome = state.analysis.analyze_route(&route).await;
    info!(route = %route.id, tier = %outcome.tier, "analyze-route served");
    Ok(Json(RouteAnalysisResponse {
        success: true,
        analysis: outcome.into_inner(),
    }))
}

/// POST /api/maps/chat
pub async fn chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let body = parse_body(&body)?;
    let message = match body.get("message").and_then(Value::as_str) {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => return Err(ApiError::bad_request(MESSAGE_INVALID)),
    };

    let places: Vec<Place> = optional_field(&body, "places")?.unwrap_or_default();
    let routes: Vec<Route> = optional_field(&body, "routes")?.unwrap_or_default();
    let location: Option<LatLng> =
        optional_field::<LatLng>(&body, "userLocation")?.filter(LatLng::is_valid);

    let response = state
        .assistant
        .answer(&message, &places, &routes, location)
        .await;
    Ok(Json(ChatResponse {
        success: true,
        response,
    }))
}

// =============================================================================
// Geospatial queries
// =============================================================================

/// GET /api/maps/search?q=&lat=&lng=
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let near = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => {
            let near = LatLng::new(lat, lng);
            if !near.is_valid() {
                return Err(ApiError::BadRequest {
                    error: "Coordonnées invalides".to_string(),
                    details: Some(near.to_string()),
                });
            }
            Some(near)
        }
        (None, None) => None,
        _ => {
            return Err(ApiError::bad_request(
                "Les paramètres lat et lng doivent être fournis ensemble",
            ))
        }
    };

    let query = params.q.unwrap_or_default();
    let places = state.geo.search_places(&query, near).await?;
    Ok(Json(SearchResponse {
        success: true,
        places,
    }))
}

/// GET /api/maps/places/{id}
pub async fn place_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PlaceResponse>, ApiError> {
    match state.geo.get_place_details(&id).await? {
        Some(place) => Ok(Json(PlaceResponse {
            success: true,
            place,
        })),
        None => Err(ApiError::NotFound("Lieu introuvable".to_string())),
    }
}

/// POST /api/maps/route
pub async fn calculate_route(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RouteResponse>, ApiError> {
    let request: RouteRequest = serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest {
        error: "Origine et destination requises".to_string(),
        details: Some(e.to_string()),
    })?;

    let route = state
        .geo
        .calculate_route(&request.origin, &request.destination)
        .await?;
    Ok(Json(RouteResponse {
        success: true,
        route,
    }))
}

/// GET /api/maps/location
///
/// Never fails: the location falls back to the configured default and the
/// address is omitted when reverse geocoding does not succeed.
pub async fn location(State(state): State<AppState>) -> Json<LocationResponse> {
    let location = state.geo.acquire_location().await;
    let address = match state.geo.reverse_geocode(location).await {
        Ok(address) => address,
        Err(e) => {
            warn!(error = %e, "Reverse geocoding failed");
            None
        }
    };
    Json(LocationResponse {
        success: true,
        location,
        address,
    })
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// =============================================================================
// Body helpers
// =============================================================================

fn parse_body(bytes: &[u8]) -> Result<Value, ApiError> {
    serde_json::from_slice(bytes).map_err(|e| ApiError::BadRequest {
        error: INVALID_JSON.to_string(),
        details: Some(e.to_string()),
    })
}

/// A field that must be present, non-null, and of the expected shape.
fn required_field<T: DeserializeOwned>(
    body: &Value,
    name: &str,
    missing: &str,
) -> Result<T, ApiError> {
    let value = match body.get(name) {
        Some(v) if !v.is_null() => v.clone(),
        _ => return Err(ApiError::bad_request(missing)),
    };
    serde_json::from_value(value).map_err(|e| ApiError::BadRequest {
        error: missing.to_string(),
        details: Some(e.to_string()),
    })
}

/// A field that may be absent or null, but must be well-typed if given.
fn optional_field<T: DeserializeOwned>(body: &Value, name: &str) -> Result<Option<T>, ApiError> {
    match body.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| ApiError::BadRequest {
                error: CONTEXT_INVALID.to_string(),
                details: Some(format!("{}: {}", name, e)),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_field_missing_and_null() {
        let body = json!({ "place": null });
        assert!(matches!(
            required_field::<Place>(&body, "place", PLACE_MISSING),
            Err(ApiError::BadRequest { details: None, .. })
        ));
        assert!(required_field::<Place>(&json!({}), "place", PLACE_MISSING).is_err());
    }

    #[test]
    fn test_required_field_wrong_type_has_details() {
        let body = json!({ "place": "Tour Eiffel" });
        match required_field::<Place>(&body, "place", PLACE_MISSING) {
            Err(ApiError::BadRequest { error, details }) => {
                assert_eq!(error, PLACE_MISSING);
                assert!(details.is_some());
            }
            other => panic!("Expected BadRequest, got {:?}", other.map(|p| p.name)),
        }
    }

    #[test]
    fn test_required_field_partial_place_uses_defaults() {
        let body = json!({ "place": { "name": "Louvre" } });
        let place: Place = required_field(&body, "place", PLACE_MISSING).unwrap();
        assert_eq!(place.name, "Louvre");
        assert!(place.types.is_empty());
    }

    #[test]
    fn test_optional_field() {
        let body = json!({ "places": null, "routes": 3 });
        assert!(optional_field::<Vec<Place>>(&body, "places").unwrap().is_none());
        assert!(optional_field::<Vec<Place>>(&body, "missing").unwrap().is_none());
        assert!(optional_field::<Vec<Route>>(&body, "routes").is_err());
    }

    #[test]
    fn test_parse_body_rejects_invalid_json() {
        assert!(matches!(
            parse_body(b"{oops"),
            Err(ApiError::BadRequest { .. })
        ));
    }
}
