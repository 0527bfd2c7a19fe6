//! Conversion of provider replies into domain entities.
//!
//! Entries are never dropped: missing fields get safe defaults instead.

use geoscope_core::types::{LatLng, Place, Review, Route, RouteStep};

use crate::provider::{ProviderPlace, ProviderRoute, TextValue};

pub const UNNAMED_PLACE: &str = "Lieu sans nom";
pub const UNKNOWN_ADDRESS: &str = "Adresse non disponible";
pub const UNKNOWN_DISTANCE: &str = "Distance inconnue";
pub const UNKNOWN_DURATION: &str = "Durée inconnue";

/// Normalize one text-search result. `index` is its position in the reply.
pub fn place_from_search<F>(raw: ProviderPlace, index: usize, photo_url: F) -> Place
where
    F: Fn(&str) -> String,
{
    let id = raw
        .place_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("place-{}", index));
    base_place(raw, id, &photo_url)
}

/// Normalize a place-details result, falling back to the requested id.
pub fn place_from_details<F>(raw: ProviderPlace, requested_id: &str, photo_url: F) -> Place
where
    F: Fn(&str) -> String,
{
    let id = raw
        .place_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| requested_id.to_string());

    let opening_hours = raw
        .opening_hours
        .as_ref()
        .and_then(|h| h.weekday_text.clone())
        .unwrap_or_default();
    let phone_number = raw.formatted_phone_number.clone();
    let website = raw.website.clone();
    let reviews = raw
        .reviews
        .clone()
        .unwrap_or_default()
        .into_iter()
        .map(|r| Review {
            author: r.author_name,
            rating: r.rating.unwrap_or(0.0),
            text: r.text,
            time: r.time,
        })
        .collect();

    Place {
        opening_hours: Some(opening_hours),
        phone_number,
        website,
        reviews: Some(reviews),
        ..base_place(raw, id, &photo_url)
    }
}

fn base_place(raw: ProviderPlace, id: String, photo_url: &dyn Fn(&str) -> String) -> Place {
    let location = raw
        .geometry
        .and_then(|g| g.location)
        .filter(LatLng::is_valid)
        .unwrap_or_default();
    let photos = raw
        .photos
        .unwrap_or_default()
        .iter()
        .map(|p| photo_url(&p.photo_reference))
        .collect();

    Place {
        id,
        name: non_empty_or(raw.name, UNNAMED_PLACE),
        address: non_empty_or(raw.formatted_address, UNKNOWN_ADDRESS),
        location,
        rating: raw.rating,
        price_level: raw.price_level,
        types: raw.types.unwrap_or_default(),
        photos: Some(photos),
        ..Place::default()
    }
}

/// Build a route from the first leg of the first provider route.
///
/// Returns `None` when the reply holds no leg with at least one step.
pub fn route_from_directions(routes: Vec<ProviderRoute>, id: String) -> Option<Route> {
    let route = routes.into_iter().next()?;
    let overview_polyline = route
        .overview_polyline
        .map(|p| p.points)
        .unwrap_or_default();
    let leg = route.legs.into_iter().next()?;
    if leg.steps.is_empty() {
        return None;
    }

    let steps = leg
        .steps
        .into_iter()
        .map(|step| RouteStep {
            instruction: step.html_instructions,
            distance: text_or(step.distance, ""),
            duration: text_or(step.duration, ""),
            start_location: step.start_location,
            end_location: step.end_location,
        })
        .collect();

    Some(Route {
        id,
        origin: leg.start_address,
        destination: leg.end_address,
        distance: text_or(leg.distance, UNKNOWN_DISTANCE),
        duration: text_or(leg.duration, UNKNOWN_DURATION),
        steps,
        overview_polyline,
    })
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn text_or(value: Option<TextValue>, default: &str) -> String {
    value
        .map(|v| v.text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| default.to_string())
}
