//! Geospatial provider boundary.
//!
//! `GeoProvider` and `LocationSource` are the only seams between the client
//! and the outside world. Each call settles exactly once, either with a
//! status-coded response or with a `ProviderFailure` when the call itself
//! could not complete. The wire types mirror the provider's JSON so an HTTP
//! implementation can deserialize straight into them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use geoscope_core::types::{LatLng, ProviderStatus};

use crate::surface::MapSurface;

/// Failure of a provider call that never produced a status-coded reply.
#[derive(Debug, thiserror::Error)]
pub enum ProviderFailure {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("location unavailable: {0}")]
    Location(String),
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TextSearchRequest {
    pub query: String,
    /// Optional location bias.
    pub location: Option<LatLng>,
    pub radius_m: u32,
}

/// Fields requested from a place-details lookup.
pub const DETAIL_FIELDS: &[&str] = &[
    "place_id",
    "name",
    "formatted_address",
    "geometry",
    "rating",
    "price_level",
    "types",
    "photos",
    "opening_hours",
    "formatted_phone_number",
    "website",
    "reviews",
];

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDetailsRequest {
    pub place_id: String,
    pub fields: Vec<String>,
}

impl PlaceDetailsRequest {
    pub fn new(place_id: impl Into<String>) -> Self {
        Self {
            place_id: place_id.into(),
            fields: DETAIL_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Routes are always driving directions with metric distances.
pub const TRAVEL_MODE: &str = "driving";
pub const UNIT_SYSTEM: &str = "metric";

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRequest {
    pub origin: String,
    pub destination: String,
}

impl DirectionsRequest {
    pub fn driving(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub location: Option<LatLng>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPhoto {
    pub photo_reference: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderOpeningHours {
    #[serde(default)]
    pub weekday_text: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderReview {
    pub author_name: String,
    pub rating: Option<f64>,
    pub text: String,
    pub time: i64,
}

/// A place as the provider returns it; every field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderPlace {
    pub place_id: Option<String>,
    pub name: Option<String>,
    pub formatted_address: Option<String>,
    pub geometry: Option<Geometry>,
    pub rating: Option<f64>,
    pub price_level: Option<u8>,
    pub types: Option<Vec<String>>,
    pub photos: Option<Vec<ProviderPhoto>>,
    pub opening_hours: Option<ProviderOpeningHours>,
    pub formatted_phone_number: Option<String>,
    pub website: Option<String>,
    pub reviews: Option<Vec<ProviderReview>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSearchResponse {
    pub status: ProviderStatus,
    #[serde(default)]
    pub results: Vec<ProviderPlace>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceDetailsResponse {
    pub status: ProviderStatus,
    #[serde(default)]
    pub result: Option<ProviderPlace>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Formatted text plus optional raw value (meters or seconds).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextValue {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderStep {
    pub html_instructions: String,
    pub distance: Option<TextValue>,
    pub duration: Option<TextValue>,
    pub start_location: LatLng,
    pub end_location: LatLng,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderLeg {
    pub start_address: String,
    pub end_address: String,
    pub start_location: Option<LatLng>,
    pub end_location: Option<LatLng>,
    pub distance: Option<TextValue>,
    pub duration: Option<TextValue>,
    pub steps: Vec<ProviderStep>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncodedPolyline {
    #[serde(default)]
    pub points: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderRoute {
    pub summary: String,
    pub overview_polyline: Option<EncodedPolyline>,
    pub legs: Vec<ProviderLeg>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionsResponse {
    pub status: ProviderStatus,
    #[serde(default)]
    pub routes: Vec<ProviderRoute>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub formatted_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub status: ProviderStatus,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

// =============================================================================
// Traits
// =============================================================================

/// The geospatial provider consumed by `GeoQueryClient`.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Load a renderable map surface centered on `center`.
    async fn load_surface(
        &self,
        center: LatLng,
        zoom: u8,
    ) -> Result<Box<dyn MapSurface>, ProviderFailure>;

    async fn text_search(
        &self,
        request: &TextSearchRequest,
    ) -> Result<TextSearchResponse, ProviderFailure>;

    async fn place_details(
        &self,
        request: &PlaceDetailsRequest,
    ) -> Result<PlaceDetailsResponse, ProviderFailure>;

    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, ProviderFailure>;

    async fn reverse_geocode(&self, location: LatLng) -> Result<GeocodeResponse, ProviderFailure>;

    /// Resolve a photo reference into a URL a client can load directly.
    fn photo_url(&self, photo_reference: &str, max_width: u32) -> String;
}

/// Source of the device's current position.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_position(&self) -> Result<LatLng, ProviderFailure>;
}

/// A location source that always reports the same coordinate.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub LatLng);

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_position(&self) -> Result<LatLng, ProviderFailure> {
        Ok(self.0)
    }
}
