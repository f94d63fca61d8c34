//! Turn a meal description into grocery ingredient phrases

use tracing::{debug, warn};

use crate::ai::{AIBackend, AIClient};

/// Meal-to-ingredients expander
#[derive(Clone, Default)]
pub struct MealExpander {
    ai: Option<AIClient>,
}

impl MealExpander {
    pub fn new(ai: Option<AIClient>) -> Self {
        Self { ai }
    }

    /// Ingredient names for a meal, or an empty list if it could not be expanded
    pub async fn expand(&self, description: &str) -> Vec<String> {
        let description = description.trim();
        if description.is_empty() {
            return Vec::new();
        }

        let Some(ai) = self.ai.as_ref() else {
            warn!("No AI backend configured, cannot expand meal");
            return Vec::new();
        };

        match ai.expand_meal(description).await {
            Ok(ingredients) => {
                debug!(meal = description, count = ingredients.len(), "Expanded meal");
                ingredients
            }
            Err(e) => {
                warn!(meal = description, "Meal expansion failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;
    use crate::ai::{MockBackend, OllamaBackend};
    use crate::config::AiConfig;
    use crate::test_utils::MockAiServer;

    #[tokio::test]
    async fn test_expand_without_ai_is_empty() {
        let expander = MealExpander::new(None);
        assert!(expander.expand("spaghetti bolognese").await.is_empty());
    }

    #[tokio::test]
    async fn test_expand_blank_description_skips_call() {
        let mock = MockBackend::new();
        let expander = MealExpander::new(Some(AIClient::Mock(mock.clone())));
        assert!(expander.expand("   ").await.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_expand_uses_backend() {
        let mock = MockBackend::new().with_meal_reply(r#"["spaghetti", " ground beef ", ""]"#);
        let expander = MealExpander::new(Some(AIClient::Mock(mock)));
        assert_eq!(
            expander.expand("spaghetti bolognese").await,
            vec!["spaghetti", "ground beef"]
        );
    }

    #[tokio::test]
    async fn test_expand_bad_reply_is_empty() {
        let mock = MockBackend::new().with_meal_reply(r#"{"ingredients": ["pasta"]}"#);
        let expander = MealExpander::new(Some(AIClient::Mock(mock)));
        assert!(expander.expand("pasta").await.is_empty());

        let expander = MealExpander::new(Some(AIClient::Mock(MockBackend::failing())));
        assert!(expander.expand("pasta").await.is_empty());
    }

    #[tokio::test]
    async fn test_expand_timeout_is_empty() {
        let server = MockAiServer::hanging().await;
        let config = AiConfig {
            default_timeout: Duration::from_secs(1),
            tasks: HashMap::new(),
        };
        let backend = OllamaBackend::with_config(&server.url(), "llama3.2", config);
        let expander = MealExpander::new(Some(AIClient::Ollama(backend)));

        assert!(expander.expand("chili for 8").await.is_empty());
        assert_eq!(server.request_count(), 1);
    }
}
