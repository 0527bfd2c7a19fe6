//! Map surfaces, the container they render into, and session diagnostics.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use geoscope_core::error::GeoscopeError;
use geoscope_core::types::LatLng;

/// Default marker icon, matching the provider's red pin.
pub const DEFAULT_MARKER_ICON: &str = "https://maps.google.com/mapfiles/ms/icons/red-dot.png";

/// A pin placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub position: LatLng,
    pub title: String,
    pub icon: Option<String>,
}

/// The route currently drawn on a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOverlay {
    pub route_id: String,
    pub overview_polyline: String,
    pub start: Option<LatLng>,
    pub end: Option<LatLng>,
}

/// A live, stateful map owned by a session.
pub trait MapSurface: Send {
    fn set_center(&mut self, center: LatLng);
    fn set_zoom(&mut self, zoom: u8);
    /// Markers are additive.
    fn add_marker(&mut self, marker: Marker);
    fn clear_markers(&mut self);
    /// Replace the drawn route; `None` removes it.
    fn set_route(&mut self, overlay: Option<RouteOverlay>);
    fn scene(&self) -> MapScene;
}

/// In-memory state of a map surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapScene {
    pub center: LatLng,
    pub zoom: u8,
    pub markers: Vec<Marker>,
    pub route: Option<RouteOverlay>,
}

impl MapScene {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self {
            center,
            zoom,
            markers: Vec::new(),
            route: None,
        }
    }

    /// Render the scene as a Static Maps URL.
    pub fn static_map_url(&self, api_base: &str, api_key: &str, width: u32, height: u32) -> String {
        let mut params: Vec<(&str, String)> = vec![
            ("center", self.center.to_string()),
            ("zoom", self.zoom.to_string()),
            ("size", format!("{}x{}", width, height)),
        ];
        for marker in &self.markers {
            params.push(("markers", marker.position.to_string()));
        }
        if let Some(ref route) = self.route {
            if !route.overview_polyline.is_empty() {
                params.push(("path", format!("enc:{}", route.overview_polyline)));
            }
        }
        params.push(("key", api_key.to_string()));

        let base = format!("{}/staticmap", api_base.trim_end_matches('/'));
        match reqwest::Url::parse_with_params(&base, &params) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, base = %base, "Invalid static map base URL");
                base
            }
        }
    }
}

impl MapSurface for MapScene {
    fn set_center(&mut self, center: LatLng) {
        self.center = center;
    }

    fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom;
    }

    fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
    }

    fn set_route(&mut self, overlay: Option<RouteOverlay>) {
        self.route = overlay;
    }

    fn scene(&self) -> MapScene {
        self.clone()
    }
}

/// The element a map renders into. On failure it shows a diagnostic instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapContainer {
    pub id: String,
    content: Option<String>,
}

impl MapContainer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: None,
        }
    }

    pub fn render(&mut self, html: impl Into<String>) {
        self.content = Some(html.into());
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

/// Handle to the live session of a `GeoQueryClient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle {
    pub id: Uuid,
}

impl SessionHandle {
    pub(crate) fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }
}

/// Session initialization failure.
///
/// `diagnostic` is the HTML shown in place of the map. It is absent only
/// when a session was already live, in which case the container is left
/// untouched.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct SessionInitError {
    #[source]
    pub error: GeoscopeError,
    pub diagnostic: Option<String>,
}

/// Build the diagnostic rendered into a container when the map cannot load.
pub fn render_diagnostic(message: &str, allowed_referrer: &str) -> String {
    format!(
        r#"<div style="padding: 20px; text-align: center; background: #f8f9fa; border-radius: 8px;">
  <h3 style="color: #dc3545;">❌ Erreur Google Maps</h3>
  <p>Impossible de charger Google Maps.</p>
  <p style="font-size: 12px; color: #666;">{}</p>
  <div style="margin: 15px 0; padding: 15px; background: #fff; border-radius: 5px;">
    <h4>🔧 Solutions :</h4>
    <p>1. Activez les APIs dans Google Cloud Console</p>
    <p>2. Ajoutez {} aux restrictions</p>
    <p>3. Vérifiez la facturation</p>
  </div>
</div>"#,
        escape_html(message),
        escape_html(allowed_referrer)
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
