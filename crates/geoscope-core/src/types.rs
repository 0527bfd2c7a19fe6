use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Coordinates
// =============================================================================

/// A WGS84 coordinate pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are finite and inside the WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

// =============================================================================
// Places
// =============================================================================

/// A user review attached to a place.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Review {
    pub author: String,
    pub rating: f64,
    pub text: String,
    /// Epoch seconds.
    pub time: i64,
}

/// A normalized place returned by search or detail lookup.
///
/// Places are never mutated after construction; analyses travel alongside.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Place {
    /// Provider id, or `place-<index>` when the provider gave none.
    pub id: String,
    pub name: String,
    pub address: String,
    pub location: LatLng,
    /// 0 to 5.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// 0 to 4.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_level: Option<u8>,
    pub types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<Review>>,
}

// =============================================================================
// Routes
// =============================================================================

/// One step of a computed route.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteStep {
    /// Provider instruction, may contain simple HTML markup.
    pub instruction: String,
    pub distance: String,
    pub duration: String,
    pub start_location: LatLng,
    pub end_location: LatLng,
}

/// A computed route. Distance and duration are provider-formatted strings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Route {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub distance: String,
    pub duration: String,
    pub steps: Vec<RouteStep>,
    /// Encoded polyline, passed through untouched.
    pub overview_polyline: String,
}

// =============================================================================
// Analyses
// =============================================================================

/// Declares a label set that a language model fills in.
///
/// The known labels get variants; anything else the model answers is kept
/// as `Other` and written back out unchanged.
macro_rules! open_label {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $label,)+
                    $name::Other(label) => label,
                }
            }

            pub fn parse(s: &str) -> Self {
                match s {
                    $($label => $name::$variant,)+
                    other => $name::Other(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(label) => label,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

open_label!(
    /// Overall tone of a place's reviews.
    Sentiment {
        Positive => "positive",
        Negative => "negative",
        Neutral => "neutral",
    }
);

open_label!(
    Difficulty {
        Easy => "easy",
        Moderate => "moderate",
        Difficult => "difficult",
    }
);

open_label!(
    ScenicValue {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

/// Narrative analysis of a place.
///
/// Every field is required when deserializing, so a model reply missing one
/// is treated as malformed. Label values outside the known set are kept.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceAnalysis {
    pub sentiment: Sentiment,
    pub category: String,
    pub highlights: Vec<String>,
    pub recommendations: Vec<String>,
    /// Symbolic tier such as "€€".
    pub price_range: String,
    pub accessibility: String,
    pub best_time_to_visit: String,
    pub summary: String,
}

/// Narrative analysis of a route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteAnalysis {
    pub difficulty: Difficulty,
    pub scenic_value: ScenicValue,
    pub traffic_prediction: String,
    pub alternative_suggestions: Vec<String>,
    pub points_of_interest: Vec<String>,
    pub travel_tips: Vec<String>,
    pub summary: String,
}

// =============================================================================
// Provider status
// =============================================================================

/// Status sentinel returned by the geospatial provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderStatus {
    Ok,
    ZeroResults,
    NotFound,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    MaxWaypointsExceeded,
    UnknownError,
    /// Any code this crate does not know, kept verbatim.
    Other(String),
}

impl ProviderStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProviderStatus::Ok)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProviderStatus::Ok => "OK",
            ProviderStatus::ZeroResults => "ZERO_RESULTS",
            ProviderStatus::NotFound => "NOT_FOUND",
            ProviderStatus::OverQueryLimit => "OVER_QUERY_LIMIT",
            ProviderStatus::RequestDenied => "REQUEST_DENIED",
            ProviderStatus::InvalidRequest => "INVALID_REQUEST",
            ProviderStatus::MaxWaypointsExceeded => "MAX_WAYPOINTS_EXCEEDED",
            ProviderStatus::UnknownError => "UNKNOWN_ERROR",
            ProviderStatus::Other(code) => code,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "OK" => ProviderStatus::Ok,
            "ZERO_RESULTS" => ProviderStatus::ZeroResults,
            "NOT_FOUND" => ProviderStatus::NotFound,
            "OVER_QUERY_LIMIT" => ProviderStatus::OverQueryLimit,
            "REQUEST_DENIED" => ProviderStatus::RequestDenied,
            "INVALID_REQUEST" => ProviderStatus::InvalidRequest,
            "MAX_WAYPOINTS_EXCEEDED" => ProviderStatus::MaxWaypointsExceeded,
            "UNKNOWN_ERROR" => ProviderStatus::UnknownError,
            other => ProviderStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for ProviderStatus {
    fn from(s: String) -> Self {
        ProviderStatus::parse(&s)
    }
}

impl From<ProviderStatus> for String {
    fn from(status: ProviderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
