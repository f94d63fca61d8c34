//! Ollama backend implementation
//!
//! HTTP client for the Ollama `/api/generate` endpoint. Models and timeouts
//! come from the AI task config, prompts from the prompt library.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AiConfig, TaskType};
use crate::error::Result;
use crate::models::Resolution;
use crate::prompts::PromptLibrary;

use super::parsing::{parse_flyer_deals, parse_ingredients, parse_product_matches};
use super::render::{expand_meal_prompt, match_products_prompt, parse_flyer_prompt};
use super::types::FlyerDeal;
use super::AIBackend;

/// Ollama backend
///
/// # Configuration
///
/// Task models and timeouts are read from `~/.local/share/grocer/config/ai.toml`:
///
/// ```toml
/// [tasks.flyer_vision]
/// model = "llama3.2-vision:11b"
/// timeout_secs = 180
/// ```
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    default_model: String,
    config: Arc<AiConfig>,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, default_model: &str) -> Self {
        Self::with_config(base_url, default_model, AiConfig::load_or_default())
    }

    /// Create with an explicit task configuration
    pub fn with_config(base_url: &str, default_model: &str, config: AiConfig) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: default_model.to_string(),
            config: Arc::new(config),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            default_model: model.to_string(),
            ..self.clone()
        }
    }

    /// Create from environment variables
    ///
    /// Required: `OLLAMA_HOST`
    /// Optional: `OLLAMA_MODEL` (default: llama3.2)
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }

    /// Run one generate call for a task
    async fn generate(&self, task: TaskType, prompt: String, images: Vec<String>) -> Result<String> {
        let request = OllamaRequest {
            model: self.config.model_for(task, &self.default_model).to_string(),
            prompt,
            images,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.config.timeout_for(task))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let ollama_response: OllamaResponse = response.json().await?;
        debug!(
            task = task.as_str(),
            "Ollama response: {}", ollama_response.response
        );

        Ok(ollama_response.response)
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    /// Base64-encoded images for vision models
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn match_products(
        &self,
        phrases: &[String],
        catalog_names: &[String],
    ) -> Result<Vec<Resolution>> {
        let prompt = match_products_prompt(&self.prompts, phrases, catalog_names)?;
        let response = self
            .generate(TaskType::ProductMatching, prompt, Vec::new())
            .await?;
        parse_product_matches(&response, phrases)
    }

    async fn expand_meal(&self, description: &str) -> Result<Vec<String>> {
        let prompt = expand_meal_prompt(&self.prompts, description)?;
        let response = self
            .generate(TaskType::MealExpansion, prompt, Vec::new())
            .await?;
        parse_ingredients(&response)
    }

    async fn parse_flyer(&self, image_data: &[u8], store: &str) -> Result<Vec<FlyerDeal>> {
        let prompt = parse_flyer_prompt(&self.prompts, store)?;
        let image = base64::engine::general_purpose::STANDARD.encode(image_data);
        let response = self
            .generate(TaskType::FlyerVision, prompt, vec![image])
            .await?;
        parse_flyer_deals(&response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.default_model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_new_trims_trailing_slash() {
        let backend = OllamaBackend::new("http://localhost:11434/", "llama3.2");
        assert_eq!(backend.host(), "http://localhost:11434");
        assert_eq!(backend.model(), "llama3.2");
    }

    #[test]
    fn test_with_model() {
        let backend = OllamaBackend::new("http://localhost:11434", "llama3.2");
        let other = backend.with_model("gemma3");
        assert_eq!(other.model(), "gemma3");
        assert_eq!(other.host(), backend.host());
    }

    #[test]
    fn test_request_omits_empty_images() {
        let request = OllamaRequest {
            model: "llama3.2".to_string(),
            prompt: "hi".to_string(),
            images: Vec::new(),
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("images").is_none());
        assert_eq!(json["stream"], false);
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let backend = OllamaBackend::new("http://localhost:99999", "llama3.2");
        assert!(!backend.health_check().await);
    }
}
