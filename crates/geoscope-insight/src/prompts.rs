//! Prompt construction. Prompts are deterministic functions of their inputs.

use geoscope_core::types::{LatLng, Place, Route};

pub const PLACE_SYSTEM: &str = "Tu es un expert en analyse de lieux touristiques et commerciaux. Tu fournis des analyses détaillées et utiles pour les voyageurs.";

pub const ROUTE_SYSTEM: &str = "Tu es un expert en navigation et planification d'itinéraires. Tu fournis des analyses détaillées pour optimiser les voyages.";

pub const CHAT_SYSTEM: &str = "Tu es un assistant Maps IA expert en navigation, recommandations de lieux et planification d'itinéraires. Tu réponds toujours en français de manière utile et concise.";

const MAX_REVIEWS: usize = 3;
const MAX_STEPS: usize = 5;
const MAX_CONTEXT_PLACES: usize = 5;
const MAX_CONTEXT_ROUTES: usize = 3;
/// Upper bound on a single context line, in characters.
pub const MAX_EXCERPT_CHARS: usize = 200;

pub fn place_prompt(place: &Place) -> String {
    let rating = place
        .rating
        .filter(|r| *r > 0.0)
        .map(|r| r.to_string())
        .unwrap_or_else(|| "Non disponible".to_string());
    let reviews = place
        .reviews
        .as_deref()
        .unwrap_or_default()
        .iter()
        .take(MAX_REVIEWS)
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join(" | ");
    let reviews = if reviews.is_empty() {
        "Aucun avis".to_string()
    } else {
        reviews
    };

    format!(
        r#"
Analyse ce lieu et fournis une analyse détaillée en JSON :

Lieu: {name}
Adresse: {address}
Note: {rating}/5
Types: {types}
Avis: {reviews}

Fournis une analyse JSON avec ces champs :
- sentiment: "positive", "negative", ou "neutral"
- category: catégorie principale du lieu
- highlights: array de 3-5 points forts
- recommendations: array de 3-4 recommandations
- priceRange: estimation du budget ("€", "€€", "€€€", "€€€€")
- accessibility: évaluation de l'accessibilité
- bestTimeToVisit: meilleur moment pour visiter
- summary: résumé en 2-3 phrases

Réponds uniquement avec le JSON, sans texte supplémentaire.
"#,
        name = place.name,
        address = place.address,
        rating = rating,
        types = place.types.join(", "),
        reviews = reviews,
    )
}

pub fn route_prompt(route: &Route) -> String {
    let steps = route
        .steps
        .iter()
        .take(MAX_STEPS)
        .enumerate()
        .map(|(i, step)| format!("{}. {} ({})", i + 1, step.instruction, step.distance))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"
Analyse cet itinéraire et fournis une analyse détaillée en JSON :

Itinéraire: {origin} → {destination}
Distance: {distance}
Durée: {duration}
Nombre d'étapes: {count}

Principales étapes:
{steps}

Fournis une analyse JSON avec ces champs :
- difficulty: "easy", "moderate", ou "difficult"
- scenic_value: "low", "medium", ou "high"
- traffic_prediction: prédiction du trafic et conseils
- alternative_suggestions: array de 2-3 suggestions d'alternatives
- points_of_interest: array de 3-5 points d'intérêt sur le trajet
- travel_tips: array de 3-4 conseils de voyage
- summary: résumé en 2-3 phrases

Réponds uniquement avec le JSON, sans texte supplémentaire.
"#,
        origin = route.origin,
        destination = route.destination,
        distance = route.distance,
        duration = route.duration,
        count = route.steps.len(),
        steps = steps,
    )
}

pub fn chat_prompt(
    question: &str,
    places: &[Place],
    routes: &[Route],
    location: Option<LatLng>,
) -> String {
    let places = places
        .iter()
        .take(MAX_CONTEXT_PLACES)
        .map(|p| {
            let rating = p
                .rating
                .filter(|r| *r > 0.0)
                .map(|r| r.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            excerpt(&format!("- {} ({}) - Note: {}/5", p.name, p.address, rating))
        })
        .collect::<Vec<_>>()
        .join("\n");

    let routes = routes
        .iter()
        .take(MAX_CONTEXT_ROUTES)
        .map(|r| {
            excerpt(&format!(
                "- {} → {} ({}, {})",
                r.origin, r.destination, r.distance, r.duration
            ))
        })
        .collect::<Vec<_>>()
        .join("\n");

    let position = match location {
        Some(l) => format!("Position actuelle: {:.4}, {:.4}", l.lat, l.lng),
        None => "Position non disponible".to_string(),
    };

    format!(
        r#"
Tu es un assistant Maps IA spécialisé dans la navigation et les recommandations géographiques.

Question: {question}

Contexte disponible:
{position}

Lieux récents:
{places}

Itinéraires récents:
{routes}

Réponds de manière utile et concise en français. Si tu n'as pas assez d'informations spécifiques, donne des conseils généraux pertinents.
"#,
        question = question,
        position = position,
        places = or_placeholder(places, "Aucun lieu récent"),
        routes = or_placeholder(routes, "Aucun itinéraire récent"),
    )
}

/// Cut `line` to at most `MAX_EXCERPT_CHARS` characters.
pub fn excerpt(line: &str) -> String {
    match line.char_indices().nth(MAX_EXCERPT_CHARS) {
        Some((idx, _)) => line[..idx].to_string(),
        None => line.to_string(),
    }
}

fn or_placeholder(text: String, placeholder: &str) -> String {
    if text.is_empty() {
        placeholder.to_string()
    } else {
        text
    }
}
