//! Integration tests for the Geoscope API.
//!
//! Each test builds its own router over in-memory providers: a scripted
//! geospatial provider and a scripted language model.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use geoscope_api::create_router;
use geoscope_api::error::ErrorBody;
use geoscope_api::handlers::{
    ChatResponse, HealthResponse, LocationResponse, PlaceAnalysisResponse, PlaceResponse,
    RouteAnalysisResponse, RouteResponse, SearchResponse,
};
use geoscope_api::state::AppState;
use geoscope_core::config::GeoscopeConfig;
use geoscope_core::types::{Difficulty, LatLng, ProviderStatus, Sentiment};
use geoscope_insight::{
    AnalysisEngine, AnalysisSettings, ChatCompletionRequest, ConversationAssistant, LanguageModel,
    LlmError,
};
use geoscope_maps::provider::{
    DirectionsRequest, DirectionsResponse, GeocodeResponse, GeocodeResult, Geometry,
    PlaceDetailsRequest, PlaceDetailsResponse, ProviderLeg, ProviderPlace, ProviderRoute,
    ProviderStep, TextSearchRequest, TextSearchResponse, TextValue,
};
use geoscope_maps::{
    ClientSettings, FixedLocation, GeoProvider, GeoQueryClient, MapScene, MapSurface,
    ProviderFailure,
};

// =============================================================================
// Fakes
// =============================================================================

struct FakeMaps;

#[async_trait]
impl GeoProvider for FakeMaps {
    async fn load_surface(
        &self,
        center: LatLng,
        zoom: u8,
    ) -> Result<Box<dyn MapSurface>, ProviderFailure> {
        Ok(Box::new(MapScene::new(center, zoom)))
    }

    async fn text_search(
        &self,
        request: &TextSearchRequest,
    ) -> Result<TextSearchResponse, ProviderFailure> {
        if request.query == "denied" {
            return Ok(TextSearchResponse {
                status: ProviderStatus::RequestDenied,
                results: vec![],
                error_message: Some("The provided API key is invalid.".to_string()),
            });
        }
        Ok(TextSearchResponse {
            status: ProviderStatus::Ok,
            results: vec![ProviderPlace {
                place_id: Some("louvre".to_string()),
                name: Some("Musée du Louvre".to_string()),
                formatted_address: Some("Rue de Rivoli, 75001 Paris".to_string()),
                geometry: Some(Geometry {
                    location: Some(LatLng::new(48.8606, 2.3376)),
                }),
                rating: Some(4.7),
                ..ProviderPlace::default()
            }],
            error_message: None,
        })
    }

    async fn place_details(
        &self,
        request: &PlaceDetailsRequest,
    ) -> Result<PlaceDetailsResponse, ProviderFailure> {
        if request.place_id != "louvre" {
            return Ok(PlaceDetailsResponse {
                status: ProviderStatus::NotFound,
                result: None,
                error_message: None,
            });
        }
        Ok(PlaceDetailsResponse {
            status: ProviderStatus::Ok,
            result: Some(ProviderPlace {
                place_id: Some("louvre".to_string()),
                name: Some("Musée du Louvre".to_string()),
                formatted_phone_number: Some("01 40 20 50 50".to_string()),
                ..ProviderPlace::default()
            }),
            error_message: None,
        })
    }

    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, ProviderFailure> {
        if request.destination == "Atlantis" {
            return Ok(DirectionsResponse {
                status: ProviderStatus::NotFound,
                routes: vec![],
                error_message: None,
            });
        }
        Ok(DirectionsResponse {
            status: ProviderStatus::Ok,
            routes: vec![ProviderRoute {
                legs: vec![ProviderLeg {
                    start_address: request.origin.clone(),
                    end_address: request.destination.clone(),
                    distance: Some(TextValue {
                        text: "115 km".to_string(),
                        value: Some(115_000.0),
                    }),
                    duration: Some(TextValue {
                        text: "1 heure 20 min".to_string(),
                        value: Some(4800.0),
                    }),
                    steps: vec![ProviderStep {
                        html_instructions: "Prendre l'<b>A10</b>".to_string(),
                        ..ProviderStep::default()
                    }],
                    ..ProviderLeg::default()
                }],
                ..ProviderRoute::default()
            }],
            error_message: None,
        })
    }

    async fn reverse_geocode(&self, _location: LatLng) -> Result<GeocodeResponse, ProviderFailure> {
        Ok(GeocodeResponse {
            status: ProviderStatus::Ok,
            results: vec![GeocodeResult {
                formatted_address: "Place Bellecour, 69002 Lyon".to_string(),
            }],
            error_message: None,
        })
    }

    fn photo_url(&self, photo_reference: &str, _max_width: u32) -> String {
        photo_reference.to_string()
    }
}

/// Language model that always returns the same reply, or is unreachable.
struct FakeModel(Option<&'static str>);

#[async_trait]
impl LanguageModel for FakeModel {
    async fn complete(&self, _request: &ChatCompletionRequest) -> Result<String, LlmError> {
        self.0
            .map(str::to_string)
            .ok_or_else(|| LlmError::Transport("connection refused".to_string()))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn make_state(model_reply: Option<&'static str>) -> AppState {
    let config = GeoscopeConfig::default();
    let geo = GeoQueryClient::new(
        Arc::new(FakeMaps),
        Arc::new(FixedLocation(LatLng::new(45.7578, 4.832))),
        ClientSettings::from(&config.maps),
    );
    let model: Arc<dyn LanguageModel> = Arc::new(FakeModel(model_reply));
    let analysis = AnalysisEngine::new(Arc::clone(&model), AnalysisSettings::from(&config.llm));
    let assistant = ConversationAssistant::new(model, &config.llm);
    AppState::new(config, geo, analysis, assistant)
}

/// Router whose language model is unreachable.
fn make_app() -> axum::Router {
    create_router(make_state(None))
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn error_body(resp: axum::response::Response) -> ErrorBody {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let resp = make_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "0.1.0");
}

// =============================================================================
// Analyze place
// =============================================================================

#[tokio::test]
async fn test_analyze_place_unreachable_model_uses_heuristics() {
    let resp = make_app()
        .oneshot(post_json(
            "/api/maps/analyze-place",
            r#"{"place":{"name":"Café X","address":"Lyon","rating":4.8,"types":["cafe"]}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: PlaceAnalysisResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(body.success);
    assert_eq!(body.analysis.sentiment, Sentiment::Positive);
    assert_eq!(body.analysis.category, "cafe");
}

#[tokio::test]
async fn test_analyze_place_model_reply() {
    let reply = r#"{"sentiment":"negative","category":"Bar","highlights":[],"recommendations":[],"priceRange":"€","accessibility":"?","bestTimeToVisit":"Soir","summary":"Bruyant."}"#;
    let resp = create_router(make_state(Some(reply)))
        .oneshot(post_json(
            "/api/maps/analyze-place",
            r#"{"place":{"name":"Le Bar"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: PlaceAnalysisResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body.analysis.sentiment, Sentiment::Negative);
    assert_eq!(body.analysis.best_time_to_visit, "Soir");
}

#[tokio::test]
async fn test_analyze_place_missing_place_returns_400() {
    let resp = make_app()
        .oneshot(post_json("/api/maps/analyze-place", r#"{"other":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(resp).await.error, "Lieu manquant dans la requête");
}

#[tokio::test]
async fn test_analyze_place_wrong_type_returns_400() {
    let resp = make_app()
        .oneshot(post_json("/api/maps/analyze-place", r#"{"place":[1,2]}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = error_body(resp).await;
    assert_eq!(body.error, "Lieu manquant dans la requête");
    assert!(body.details.is_some());
}

#[tokio::test]
async fn test_invalid_json_returns_400() {
    let resp = make_app()
        .oneshot(post_json("/api/maps/analyze-place", "{not json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Analyze route
// =============================================================================

#[tokio::test]
async fn test_analyze_route_malformed_reply_uses_template() {
    let steps: Vec<Value> = (0..12)
        .map(|i| serde_json::json!({ "instruction": format!("Étape {}", i) }))
        .collect();
    let body = serde_json::json!({
        "route": {
            "id": "route-1",
            "origin": "Paris",
            "destination": "Tours",
            "distance": "150 km",
            "duration": "2h",
            "steps": steps,
        }
    });
    let resp = create_router(make_state(Some("pas du JSON")))
        .oneshot(post_json("/api/maps/analyze-route", &body.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: RouteAnalysisResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body.analysis.difficulty, Difficulty::Moderate);
}

#[tokio::test]
async fn test_analyze_route_unreachable_model_long_distance() {
    let resp = make_app()
        .oneshot(post_json(
            "/api/maps/analyze-route",
            r#"{"route":{"origin":"Paris","destination":"Bordeaux","distance":"250 km","duration":"5h","steps":[]}}"#,
        ))
        .await
        .unwrap();
    let body: RouteAnalysisResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body.analysis.difficulty, Difficulty::Difficult);
}

#[tokio::test]
async fn test_analyze_route_missing_route_returns_400() {
    let resp = make_app()
        .oneshot(post_json("/api/maps/analyze-route", r#"{"route":null}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(resp).await.error, "Itinéraire manquant dans la requête");
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_parking_fallback() {
    let resp = make_app()
        .oneshot(post_json(
            "/api/maps/chat",
            r#"{"message":"Où trouver un parking ?"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: ChatResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(body.success);
    assert!(body.response.starts_with("Recherchez \"parking\""));
}

#[tokio::test]
async fn test_chat_with_context_and_model_reply() {
    let resp = create_router(make_state(Some("Allez au Vieux Lyon.")))
        .oneshot(post_json(
            "/api/maps/chat",
            r#"{"message":"Que visiter ?","places":[{"name":"Fourvière"}],"routes":[],"userLocation":{"lat":45.76,"lng":4.83}}"#,
        ))
        .await
        .unwrap();
    let body: ChatResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body.response, "Allez au Vieux Lyon.");
}

#[tokio::test]
async fn test_chat_non_string_message_returns_400() {
    for json in [r#"{"message":42}"#, r#"{"message":""}"#, r#"{}"#] {
        let resp = make_app()
            .oneshot(post_json("/api/maps/chat", json))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(resp).await.error, "Message manquant ou invalide");
    }
}

#[tokio::test]
async fn test_chat_wrong_typed_context_returns_400() {
    let resp = make_app()
        .oneshot(post_json(
            "/api/maps/chat",
            r#"{"message":"Bonjour","places":"Louvre"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Geospatial queries
// =============================================================================

#[tokio::test]
async fn test_search_happy_path() {
    let resp = make_app()
        .oneshot(get("/api/maps/search?q=louvre&lat=48.86&lng=2.34"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: SearchResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body.places.len(), 1);
    assert_eq!(body.places[0].id, "louvre");
    assert_eq!(body.places[0].rating, Some(4.7));
}

#[tokio::test]
async fn test_search_blank_query_returns_empty() {
    let resp = make_app().oneshot(get("/api/maps/search?q=")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: SearchResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(body.places.is_empty());
}

#[tokio::test]
async fn test_search_provider_denial_returns_502() {
    let resp = make_app()
        .oneshot(get("/api/maps/search?q=denied"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = error_body(resp).await;
    assert!(body.details.unwrap().contains("REQUEST_DENIED"));
}

#[tokio::test]
async fn test_search_rejects_partial_or_invalid_coordinates() {
    let resp = make_app()
        .oneshot(get("/api/maps/search?q=cafe&lat=48.8"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = make_app()
        .oneshot(get("/api/maps/search?q=cafe&lat=95&lng=2"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_place_details_found_and_missing() {
    let resp = make_app()
        .oneshot(get("/api/maps/places/louvre"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: PlaceResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body.place.phone_number.as_deref(), Some("01 40 20 50 50"));

    let resp = make_app()
        .oneshot(get("/api/maps/places/nowhere"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_route_happy_path() {
    let resp = make_app()
        .oneshot(post_json(
            "/api/maps/route",
            r#"{"origin":"Paris","destination":"Chartres"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: RouteResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(body.route.id.starts_with("route-"));
    assert_eq!(body.route.distance, "115 km");
    assert_eq!(body.route.steps.len(), 1);
}

#[tokio::test]
async fn test_route_validation_and_provider_errors() {
    let resp = make_app()
        .oneshot(post_json(
            "/api/maps/route",
            r#"{"origin":" ","destination":"Chartres"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = make_app()
        .oneshot(post_json("/api/maps/route", r#"{"origin":"Paris"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = make_app()
        .oneshot(post_json(
            "/api/maps/route",
            r#"{"origin":"Paris","destination":"Atlantis"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_location_includes_address() {
    let resp = make_app().oneshot(get("/api/maps/location")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: LocationResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body.location, LatLng::new(45.7578, 4.832));
    assert_eq!(body.address.as_deref(), Some("Place Bellecour, 69002 Lyon"));
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let resp = make_app().oneshot(get("/api/maps/unknown")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
