//! Free-text geographic question answering.

use std::sync::Arc;

use tracing::{debug, warn};

use geoscope_core::config::LlmConfig;
use geoscope_core::types::{LatLng, Place, Route};

use crate::llm::{ChatCompletionRequest, LanguageModel};
use crate::prompts;

pub const EMPTY_REPLY: &str =
    "Désolé, je n'ai pas pu traiter votre question. Pouvez-vous la reformuler ?";

const RESTAURANT_REPLY: &str = "Pour trouver des restaurants, utilisez la recherche avec \"restaurant\" suivi de votre localisation. Je peux vous aider à analyser les options trouvées !";
const ROUTE_REPLY: &str = "Pour calculer un itinéraire, entrez votre point de départ et votre destination. Je peux ensuite analyser le trajet et vous donner des conseils !";
const PARKING_REPLY: &str = "Recherchez \"parking\" près de votre destination. Les parkings publics sont généralement indiqués sur la carte avec des informations tarifaires.";
const GENERIC_REPLY: &str = "Je peux vous aider avec la recherche de lieux, le calcul d'itinéraires, et l'analyse de vos trajets. Que souhaitez-vous faire ?";

/// Answers questions with the recent places, routes and position as context.
pub struct ConversationAssistant {
    model: Arc<dyn LanguageModel>,
    temperature: f32,
    max_tokens: u32,
}

impl ConversationAssistant {
    pub fn new(model: Arc<dyn LanguageModel>, config: &LlmConfig) -> Self {
        Self {
            model,
            temperature: config.chat_temperature,
            max_tokens: config.chat_max_tokens,
        }
    }

    /// Always returns a non-empty answer.
    pub async fn answer(
        &self,
        question: &str,
        places: &[Place],
        routes: &[Route],
        location: Option<LatLng>,
    ) -> String {
        let request = ChatCompletionRequest {
            system: prompts::CHAT_SYSTEM.to_string(),
            user: prompts::chat_prompt(question, places, routes, location),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match self.model.complete(&request).await {
            Ok(reply) if reply.trim().is_empty() => {
                debug!("Empty chat completion");
                EMPTY_REPLY.to_string()
            }
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Chat call failed, using keyword fallback");
                keyword_fallback(question).to_string()
            }
        }
    }
}

/// Canned answer picked from keywords in the question.
pub fn keyword_fallback(question: &str) -> &'static str {
    let q = question.to_lowercase();
    if q.contains("restaurant") {
        RESTAURANT_REPLY
    } else if q.contains("itinéraire") || q.contains("aller") {
        ROUTE_REPLY
    } else if q.contains("parking") {
        PARKING_REPLY
    } else {
        GENERIC_REPLY
    }
}
