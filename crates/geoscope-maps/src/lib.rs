//! Geospatial querying for Geoscope: provider boundary, normalization, and
//! the session-owning `GeoQueryClient`.

pub mod client;
pub mod google;
pub mod normalize;
pub mod provider;
pub mod surface;

pub use client::{ClientSettings, GeoQueryClient};
pub use google::GoogleMapsClient;
pub use provider::{FixedLocation, GeoProvider, LocationSource, ProviderFailure};
pub use surface::{MapContainer, MapScene, MapSurface, SessionHandle, SessionInitError};
