//! GeoQueryClient: validation, provider requests, normalization, and the
//! lifecycle of one live map session.
//!
//! The client is fail-visible: provider failures come back as
//! `GeoscopeError` and nothing is retried. Location acquisition is the one
//! exception and always resolves.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info, warn};

use geoscope_core::config::MapsConfig;
use geoscope_core::error::{GeoscopeError, Result};
use geoscope_core::types::{LatLng, Place, ProviderStatus, Route};

use crate::normalize;
use crate::provider::{
    DirectionsRequest, GeoProvider, LocationSource, PlaceDetailsRequest, ProviderFailure,
    TextSearchRequest,
};
use crate::surface::{
    render_diagnostic, MapContainer, MapScene, MapSurface, Marker, RouteOverlay, SessionHandle,
    SessionInitError, DEFAULT_MARKER_ICON,
};

/// Tunables for a `GeoQueryClient`.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub search_radius_m: u32,
    pub default_zoom: u8,
    pub focus_zoom: u8,
    pub location_timeout: Duration,
    pub default_location: LatLng,
    pub photo_max_width: u32,
    pub allowed_referrer: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from(&MapsConfig::default())
    }
}

impl From<&MapsConfig> for ClientSettings {
    fn from(config: &MapsConfig) -> Self {
        Self {
            search_radius_m: config.search_radius_m,
            default_zoom: config.default_zoom,
            focus_zoom: config.focus_zoom,
            location_timeout: Duration::from_secs(config.location_timeout_secs),
            default_location: config.default_location,
            photo_max_width: config.photo_max_width,
            allowed_referrer: config.allowed_referrer.clone(),
        }
    }
}

struct LiveSession {
    handle: SessionHandle,
    surface: Box<dyn MapSurface>,
}

/// Client around the geospatial provider. Owns at most one live session.
pub struct GeoQueryClient {
    provider: Arc<dyn GeoProvider>,
    locator: Arc<dyn LocationSource>,
    settings: ClientSettings,
    session: Mutex<Option<LiveSession>>,
    last_route_stamp: AtomicI64,
}

impl GeoQueryClient {
    pub fn new(
        provider: Arc<dyn GeoProvider>,
        locator: Arc<dyn LocationSource>,
        settings: ClientSettings,
    ) -> Self {
        Self {
            provider,
            locator,
            settings,
            session: Mutex::new(None),
            last_route_stamp: AtomicI64::new(0),
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    // -------------------------------------------------------------------------
    // Location
    // -------------------------------------------------------------------------

    /// Current device location, or the configured default.
    ///
    /// Waits at most `location_timeout`; never fails.
    pub async fn acquire_location(&self) -> LatLng {
        let fallback = self.settings.default_location;
        match tokio::time::timeout(self.settings.location_timeout, self.locator.current_position())
            .await
        {
            Ok(Ok(location)) if location.is_valid() => {
                debug!(lat = location.lat, lng = location.lng, "Location acquired");
                location
            }
            Ok(Ok(location)) => {
                warn!(
                    lat = location.lat,
                    lng = location.lng,
                    "Invalid coordinates from location source, using default"
                );
                fallback
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Location unavailable, using default");
                fallback
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.settings.location_timeout.as_millis() as u64,
                    "Location request timed out, using default"
                );
                fallback
            }
        }
    }

    // -------------------------------------------------------------------------
    // Session lifecycle
    // -------------------------------------------------------------------------

    /// Load a map surface into `container`, centered on `center`.
    ///
    /// Inputs are validated before the provider is contacted. On validation
    /// or load failure the diagnostic is rendered into the container (when
    /// there is one) and returned with the error.
    pub async fn initialize_session(
        &self,
        container: Option<&mut MapContainer>,
        center: LatLng,
    ) -> std::result::Result<SessionHandle, SessionInitError> {
        let container = match container {
            Some(c) => c,
            None => {
                let error = GeoscopeError::InvalidInput("Conteneur manquant pour la carte".into());
                return Err(self.init_failure(None, error));
            }
        };

        if !center.lat.is_finite() || !center.lng.is_finite() {
            let error = GeoscopeError::InvalidInput("Coordonnées non numériques".into());
            return Err(self.init_failure(Some(container), error));
        }
        if !center.is_valid() {
            let error = GeoscopeError::InvalidInput("Coordonnées hors limites".into());
            return Err(self.init_failure(Some(container), error));
        }

        if let Some(active) = self.session_handle() {
            warn!(session = %active.id, "Map session already active");
            return Err(SessionInitError {
                error: GeoscopeError::SessionActive(active.id),
                diagnostic: None,
            });
        }

        info!(lat = center.lat, lng = center.lng, container = %container.id, "Loading map surface");
        let surface = match self
            .provider
            .load_surface(center, self.settings.default_zoom)
            .await
        {
            Ok(surface) => surface,
            Err(e) => {
                let error = failure_to_error("map load", e);
                return Err(self.init_failure(Some(container), error));
            }
        };

        let mut session = self.lock_session();
        if let Some(ref live) = *session {
            // Another initialization won the race while the surface loaded.
            return Err(SessionInitError {
                error: GeoscopeError::SessionActive(live.handle.id),
                diagnostic: None,
            });
        }
        let handle = SessionHandle::new();
        *session = Some(LiveSession { handle, surface });
        info!(session = %handle.id, "Map session ready");
        Ok(handle)
    }

    /// Tear down the live session identified by `handle`.
    pub fn close_session(&self, handle: SessionHandle) -> Result<()> {
        let mut session = self.lock_session();
        match *session {
            Some(ref live) if live.handle == handle => {
                *session = None;
                info!(session = %handle.id, "Map session closed");
                Ok(())
            }
            _ => Err(GeoscopeError::SessionNotFound(handle.id)),
        }
    }

    pub fn session_handle(&self) -> Option<SessionHandle> {
        self.lock_session().as_ref().map(|s| s.handle)
    }

    /// Snapshot of the live surface, if any.
    pub fn scene(&self) -> Option<MapScene> {
        self.lock_session().as_ref().map(|s| s.surface.scene())
    }

    /// Recenter the live map and zoom in. No-op without a session.
    pub fn pan_to(&self, location: LatLng) {
        if !location.is_valid() {
            warn!(lat = location.lat, lng = location.lng, "Ignoring pan to invalid location");
            return;
        }
        if let Some(ref mut live) = *self.lock_session() {
            live.surface.set_center(location);
            live.surface.set_zoom(self.settings.focus_zoom);
        }
    }

    /// Remove the rendered route and markers. Idempotent.
    pub fn clear_route(&self) {
        if let Some(ref mut live) = *self.lock_session() {
            live.surface.set_route(None);
            live.surface.clear_markers();
            debug!(session = %live.handle.id, "Route and markers cleared");
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Text search biased towards `near`.
    ///
    /// A blank query returns no places without contacting the provider.
    pub async fn search_places(&self, query: &str, near: Option<LatLng>) -> Result<Vec<Place>> {
        let query = query.trim();
        if query.is_empty() {
            debug!("Skipping search for blank query");
            return Ok(Vec::new());
        }

        let request = TextSearchRequest {
            query: query.to_string(),
            location: near.filter(LatLng::is_valid),
            radius_m: self.settings.search_radius_m,
        };
        let response = self
            .provider
            .text_search(&request)
            .await
            .map_err(|e| failure_to_error("text search", e))?;

        if !response.status.is_ok() {
            warn!(query = %query, status = %response.status, "Place search failed");
            return Err(GeoscopeError::provider("text search", response.status));
        }

        let width = self.settings.photo_max_width;
        let places: Vec<Place> = response
            .results
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                normalize::place_from_search(raw, i, |r| self.provider.photo_url(r, width))
            })
            .collect();

        self.mark_places(&places);
        info!(query = %query, count = places.len(), "Places found");
        Ok(places)
    }

    /// Full details for a place id; `None` when the provider cannot resolve it.
    pub async fn get_place_details(&self, place_id: &str) -> Result<Option<Place>> {
        let place_id = place_id.trim();
        if place_id.is_empty() {
            return Err(GeoscopeError::InvalidInput("place id must not be empty".into()));
        }

        let request = PlaceDetailsRequest::new(place_id);
        let response = match self.provider.place_details(&request).await {
            Ok(r) => r,
            Err(e) => {
                warn!(place_id = %place_id, error = %e, "Place details call failed");
                return Ok(None);
            }
        };

        match response.result {
            Some(raw) if response.status.is_ok() => {
                let width = self.settings.photo_max_width;
                Ok(Some(normalize::place_from_details(raw, place_id, |r| {
                    self.provider.photo_url(r, width)
                })))
            }
            _ => {
                debug!(place_id = %place_id, status = %response.status, "Place not resolved");
                Ok(None)
            }
        }
    }

    /// Driving route between two free-text locations.
    ///
    /// Only the first alternative is kept. It replaces any route drawn on
    /// the live session.
    pub async fn calculate_route(&self, origin: &str, destination: &str) -> Result<Route> {
        let (origin, destination) = (origin.trim(), destination.trim());
        if origin.is_empty() || destination.is_empty() {
            return Err(GeoscopeError::InvalidInput(
                "origin and destination must not be empty".into(),
            ));
        }

        let request = DirectionsRequest::driving(origin, destination);
        let response = self
            .provider
            .directions(&request)
            .await
            .map_err(|e| failure_to_error("directions", e))?;

        if !response.status.is_ok() {
            warn!(origin = %origin, destination = %destination, status = %response.status, "Route calculation failed");
            return Err(GeoscopeError::provider("directions", response.status));
        }

        let route = normalize::route_from_directions(response.routes, self.next_route_id())
            .ok_or_else(|| GeoscopeError::provider("directions", ProviderStatus::ZeroResults))?;

        if let Some(ref mut live) = *self.lock_session() {
            live.surface.set_route(Some(RouteOverlay {
                route_id: route.id.clone(),
                overview_polyline: route.overview_polyline.clone(),
                start: route.steps.first().map(|s| s.start_location),
                end: route.steps.last().map(|s| s.end_location),
            }));
        }

        info!(
            route_id = %route.id,
            distance = %route.distance,
            duration = %route.duration,
            steps = route.steps.len(),
            "Route calculated"
        );
        Ok(route)
    }

    /// Human-readable address for a coordinate, if the provider knows one.
    pub async fn reverse_geocode(&self, location: LatLng) -> Result<Option<String>> {
        if !location.is_valid() {
            return Err(GeoscopeError::InvalidInput(format!(
                "coordinates out of range: {}",
                location
            )));
        }

        let response = self
            .provider
            .reverse_geocode(location)
            .await
            .map_err(|e| failure_to_error("reverse geocode", e))?;

        match response.status {
            ProviderStatus::Ok => Ok(response
                .results
                .into_iter()
                .map(|r| r.formatted_address)
                .find(|a| !a.is_empty())),
            ProviderStatus::ZeroResults => Ok(None),
            status => Err(GeoscopeError::provider("reverse geocode", status)),
        }
    }

    // -- Private helpers --

    fn lock_session(&self) -> MutexGuard<'_, Option<LiveSession>> {
        // A poisoned lock only means a surface call panicked; the scene is
        // still usable.
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn mark_places(&self, places: &[Place]) {
        if let Some(ref mut live) = *self.lock_session() {
            for place in places {
                live.surface.add_marker(Marker {
                    position: place.location,
                    title: place.name.clone(),
                    icon: Some(DEFAULT_MARKER_ICON.to_string()),
                });
            }
        }
    }

    fn init_failure(
        &self,
        container: Option<&mut MapContainer>,
        error: GeoscopeError,
    ) -> SessionInitError {
        warn!(error = %error, "Map session initialization failed");
        let diagnostic = render_diagnostic(&error.to_string(), &self.settings.allowed_referrer);
        if let Some(container) = container {
            container.render(diagnostic.clone());
        }
        SessionInitError {
            error,
            diagnostic: Some(diagnostic),
        }
    }

    /// Time-based id, strictly increasing per client.
    fn next_route_id(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self
            .last_route_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        format!("route-{}", now.max(previous + 1))
    }
}

fn failure_to_error(context: &str, failure: ProviderFailure) -> GeoscopeError {
    warn!(context, error = %failure, "Provider call failed");
    let status = match failure {
        ProviderFailure::Http { status: 403, .. } => ProviderStatus::RequestDenied,
        ProviderFailure::Http { status: 429, .. } => ProviderStatus::OverQueryLimit,
        _ => ProviderStatus::UnknownError,
    };
    GeoscopeError::provider(format!("{}: {}", context, failure), status)
}
