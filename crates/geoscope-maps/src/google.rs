//! Google Maps web-service implementation of `GeoProvider` and
//! `LocationSource`.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use geoscope_core::config::MapsConfig;
use geoscope_core::error::{GeoscopeError, Result};
use geoscope_core::types::LatLng;

use crate::provider::{
    DirectionsRequest, DirectionsResponse, GeoProvider, GeocodeResponse, LocationSource,
    PlaceDetailsRequest, PlaceDetailsResponse, ProviderFailure, TextSearchRequest,
    TextSearchResponse, TRAVEL_MODE, UNIT_SYSTEM,
};
use crate::surface::{MapScene, MapSurface};

const USER_AGENT: &str = concat!("geoscope/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the Places, Directions, Geocoding and Geolocation APIs.
#[derive(Clone)]
pub struct GoogleMapsClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    geolocation_base: String,
    language: String,
}

#[derive(serde::Serialize)]
struct GeolocateRequest {
    #[serde(rename = "considerIp")]
    consider_ip: bool,
}

#[derive(serde::Deserialize)]
struct GeolocateResponse {
    location: LatLng,
}

impl GoogleMapsClient {
    pub fn new(config: &MapsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GeoscopeError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            geolocation_base: config.geolocation_base.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        })
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Build a web-service URL. The key and language are always appended.
    fn endpoint(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> std::result::Result<reqwest::Url, ProviderFailure> {
        let mut all: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        all.push(("language", self.language.as_str()));
        all.push(("key", self.api_key.as_str()));
        reqwest::Url::parse_with_params(&format!("{}/{}", self.api_base, path), &all)
            .map_err(|e| ProviderFailure::Transport(format!("invalid URL: {}", e)))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> std::result::Result<T, ProviderFailure> {
        let url = self.endpoint(path, params)?;
        debug!(path, "Provider request");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderFailure::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderFailure::Decode(e.to_string()))
    }
}

#[async_trait]
impl GeoProvider for GoogleMapsClient {
    async fn load_surface(
        &self,
        center: LatLng,
        zoom: u8,
    ) -> std::result::Result<Box<dyn MapSurface>, ProviderFailure> {
        if !self.has_key() {
            return Err(ProviderFailure::Unavailable(
                "Clé API Google Maps manquante".to_string(),
            ));
        }
        Ok(Box::new(MapScene::new(center, zoom)))
    }

    async fn text_search(
        &self,
        request: &TextSearchRequest,
    ) -> std::result::Result<TextSearchResponse, ProviderFailure> {
        let mut params = vec![("query", request.query.clone())];
        if let Some(location) = request.location {
            params.push(("location", location.to_string()));
            params.push(("radius", request.radius_m.to_string()));
        }
        self.get_json("place/textsearch/json", &params).await
    }

    async fn place_details(
        &self,
        request: &PlaceDetailsRequest,
    ) -> std::result::Result<PlaceDetailsResponse, ProviderFailure> {
        let params = [
            ("place_id", request.place_id.clone()),
            ("fields", request.fields.join(",")),
        ];
        self.get_json("place/details/json", &params).await
    }

    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> std::result::Result<DirectionsResponse, ProviderFailure> {
        self.get_json("directions/json", &directions_params(request)).await
    }

    async fn reverse_geocode(
        &self,
        location: LatLng,
    ) -> std::result::Result<GeocodeResponse, ProviderFailure> {
        self.get_json("geocode/json", &[("latlng", location.to_string())])
            .await
    }

    fn photo_url(&self, photo_reference: &str, max_width: u32) -> String {
        let base = format!("{}/place/photo", self.api_base);
        let width = max_width.to_string();
        let params = [
            ("maxwidth", width.as_str()),
            ("photo_reference", photo_reference),
            ("key", self.api_key.as_str()),
        ];
        match reqwest::Url::parse_with_params(&base, &params) {
            Ok(url) => url.to_string(),
            Err(_) => base,
        }
    }
}

#[async_trait]
impl LocationSource for GoogleMapsClient {
    async fn current_position(&self) -> std::result::Result<LatLng, ProviderFailure> {
        if !self.has_key() {
            return Err(ProviderFailure::Location("no API key configured".into()));
        }
        let url = reqwest::Url::parse_with_params(
            &format!("{}/geolocate", self.geolocation_base),
            &[("key", self.api_key.as_str())],
        )
        .map_err(|e| ProviderFailure::Location(e.to_string()))?;

        let response = self
            .http
            .post(url)
            .json(&GeolocateRequest { consider_ip: true })
            .send()
            .await
            .map_err(|e| ProviderFailure::Location(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderFailure::Location(format!(
                "geolocation returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: GeolocateResponse = response
            .json()
            .await
            .map_err(|e| ProviderFailure::Decode(e.to_string()))?;
        Ok(body.location)
    }
}

fn directions_params(request: &DirectionsRequest) -> [(&'static str, String); 4] {
    [
        ("origin", request.origin.clone()),
        ("destination", request.destination.clone()),
        ("mode", TRAVEL_MODE.to_string()),
        ("units", UNIT_SYSTEM.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(key: &str) -> GoogleMapsClient {
        let config = MapsConfig {
            api_key: key.to_string(),
            api_base: "https://maps.example.test/maps/api/".to_string(),
            ..MapsConfig::default()
        };
        GoogleMapsClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_appends_language_and_key() {
        let url = client("secret")
            .endpoint("place/textsearch/json", &[("query", "café crème".to_string())])
            .unwrap();
        assert_eq!(url.path(), "/maps/api/place/textsearch/json");
        let query = url.query().unwrap();
        assert!(query.contains("query=caf%C3%A9+cr%C3%A8me"));
        assert!(query.contains("language=fr"));
        assert!(query.ends_with("key=secret"));
    }

    #[test]
    fn test_directions_query_is_driving_metric() {
        let request = DirectionsRequest::driving("Paris", "Orléans");
        let url = client("k")
            .endpoint("directions/json", &directions_params(&request))
            .unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("origin=Paris"));
        assert!(query.contains("destination=Orl%C3%A9ans"));
        assert!(query.contains("mode=driving"));
        assert!(query.contains("units=metric"));
        assert!(!query.contains("avoid="));
    }

    #[test]
    fn test_photo_url() {
        let url = client("k").photo_url("ref/1", 400);
        assert!(url.starts_with("https://maps.example.test/maps/api/place/photo?"));
        assert!(url.contains("maxwidth=400"));
        assert!(url.contains("photo_reference=ref%2F1"));
    }

    #[tokio::test]
    async fn test_load_surface_requires_key() {
        let err = match client("").load_surface(LatLng::new(0.0, 0.0), 13).await {
            Err(e) => e,
            Ok(_) => panic!("Expected missing key to fail"),
        };
        assert!(matches!(err, ProviderFailure::Unavailable(_)));

        let surface = client("k")
            .load_surface(LatLng::new(48.0, 2.0), 13)
            .await
            .unwrap();
        assert_eq!(surface.scene().zoom, 13);
    }

    #[tokio::test]
    async fn test_location_without_key_fails_fast() {
        assert!(matches!(
            client(" ").current_position().await,
            Err(ProviderFailure::Location(_))
        ));
    }

    #[test]
    fn test_geolocate_request_body() {
        let body = serde_json::to_string(&GeolocateRequest { consider_ip: true }).unwrap();
        assert_eq!(body, r#"{"considerIp":true}"#);
    }
}
