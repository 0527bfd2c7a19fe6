//! API error types and JSON error response formatting.
//!
//! Every failure is rendered as `{ "error": ..., "details": ... }` with a
//! user-facing French message in `error`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use geoscope_core::error::GeoscopeError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid body fields.
    BadRequest {
        error: String,
        details: Option<String>,
    },
    /// 404 Not Found - the provider could not resolve the resource.
    NotFound(String),
    /// 502 Bad Gateway - the geospatial provider refused or failed.
    Upstream { error: String, details: String },
    /// 500 Internal Server Error - unexpected failure.
    Internal { error: String, details: String },
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>) -> Self {
        ApiError::BadRequest {
            error: error.into(),
            details: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest { error, details } => ErrorBody { error, details },
            ApiError::NotFound(error) => ErrorBody {
                error,
                details: None,
            },
            ApiError::Upstream { error, details } | ApiError::Internal { error, details } => {
                ErrorBody {
                    error,
                    details: Some(details),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<GeoscopeError> for ApiError {
    fn from(err: GeoscopeError) -> Self {
        match err {
            GeoscopeError::InvalidInput(msg) => ApiError::BadRequest {
                error: "Requête invalide".to_string(),
                details: Some(msg),
            },
            GeoscopeError::Provider { .. } => ApiError::Upstream {
                error: "Erreur du service de cartographie".to_string(),
                details: err.to_string(),
            },
            other => ApiError::Internal {
                error: "Erreur interne".to_string(),
                details: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoscope_core::types::ProviderStatus;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(GeoscopeError::provider("directions", ProviderStatus::NotFound))
                .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(GeoscopeError::Config("bind failed".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_input_keeps_message_in_details() {
        match ApiError::from(GeoscopeError::InvalidInput("origin vide".into())) {
            ApiError::BadRequest { details, .. } => {
                assert_eq!(details.as_deref(), Some("origin vide"))
            }
            other => panic!("Expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_error_body_omits_missing_details() {
        let json = serde_json::to_string(&ErrorBody {
            error: "Lieu manquant dans la requête".to_string(),
            details: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"error":"Lieu manquant dans la requête"}"#);
    }
}
