//! Google Gemini backend implementation
//!
//! Calls the `generateContent` endpoint of the Generative Language API.
//! Text tasks send a single user turn; flyer scans add the image as an
//! `inline_data` part.
//!
//! # Configuration
//!
//! Environment variables:
//! - `GEMINI_API_KEY`: API key (required; the `.env` placeholder counts as unset)
//! - `GEMINI_MODEL`: Model name (default: gemini-2.0-flash)
//! - `GEMINI_BASE_URL`: API root (default: the public v1beta endpoint)

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AiConfig, TaskType};
use crate::error::{Error, Result};
use crate::models::Resolution;
use crate::prompts::PromptLibrary;

use super::parsing::{parse_flyer_deals, parse_ingredients, parse_product_matches};
use super::render::{
    expand_meal_prompt, image_mime_type, match_products_prompt, parse_flyer_prompt,
};
use super::types::FlyerDeal;
use super::AIBackend;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Value shipped in `.env.example`; treated the same as a missing key
const PLACEHOLDER_API_KEY: &str = "your_gemini_api_key_here";

/// Gemini backend
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
    config: Arc<AiConfig>,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl GeminiBackend {
    /// Create a backend against the public API
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, model)
    }

    /// Create a backend against a custom API root (proxies, test servers)
    pub fn with_base_url(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            config: Arc::new(AiConfig::load_or_default()),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Create from environment variables
    ///
    /// Returns None when `GEMINI_API_KEY` is unset, empty, or still the placeholder.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        if !is_usable_api_key(&api_key) {
            return None;
        }

        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Some(Self::with_base_url(&base_url, api_key.trim(), &model))
    }

    /// Run one generateContent call for a task and return the concatenated text
    async fn generate(&self, task: TaskType, parts: Vec<Part>) -> Result<String> {
        let model = self.config.model_for(task, &self.model);
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig { temperature: 0.1 },
        };

        let response = self
            .http_client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.config.timeout_for(task))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InvalidData(format!(
                "Gemini API error {}: {}",
                status, body
            )));
        }

        let gemini_response: GenerateResponse = response.json().await?;
        let text = gemini_response.text();
        debug!(task = task.as_str(), model, "Gemini response: {}", text);

        if text.trim().is_empty() {
            return Err(Error::InvalidData(
                "Gemini returned no text candidates".into(),
            ));
        }
        Ok(text)
    }
}

fn is_usable_api_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != PLACEHOLDER_API_KEY
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text parts of the first candidate, joined
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl AIBackend for GeminiBackend {
    async fn match_products(
        &self,
        phrases: &[String],
        catalog_names: &[String],
    ) -> Result<Vec<Resolution>> {
        let prompt = match_products_prompt(&self.prompts, phrases, catalog_names)?;
        let response = self
            .generate(TaskType::ProductMatching, vec![Part::Text { text: prompt }])
            .await?;
        parse_product_matches(&response, phrases)
    }

    async fn expand_meal(&self, description: &str) -> Result<Vec<String>> {
        let prompt = expand_meal_prompt(&self.prompts, description)?;
        let response = self
            .generate(TaskType::MealExpansion, vec![Part::Text { text: prompt }])
            .await?;
        parse_ingredients(&response)
    }

    async fn parse_flyer(&self, image_data: &[u8], store: &str) -> Result<Vec<FlyerDeal>> {
        let prompt = parse_flyer_prompt(&self.prompts, store)?;
        let parts = vec![
            Part::Text { text: prompt },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: image_mime_type(image_data).to_string(),
                    data: base64::engine::general_purpose::STANDARD.encode(image_data),
                },
            },
        ];

        let response = self.generate(TaskType::FlyerVision, parts).await?;
        parse_flyer_deals(&response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/models/{}", self.base_url, self.model))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_key_is_not_usable() {
        assert!(!is_usable_api_key(""));
        assert!(!is_usable_api_key("   "));
        assert!(!is_usable_api_key(PLACEHOLDER_API_KEY));
        assert!(is_usable_api_key("AIzaSyExample"));
    }

    #[test]
    fn test_new_uses_public_endpoint() {
        let backend = GeminiBackend::new("key", DEFAULT_MODEL);
        assert_eq!(backend.host(), DEFAULT_BASE_URL);
        assert_eq!(backend.model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_with_base_url_trims_trailing_slash() {
        let backend = GeminiBackend::with_base_url("http://127.0.0.1:9000/", "key", "m");
        assert_eq!(backend.host(), "http://127.0.0.1:9000");
        assert_eq!(backend.with_model("other").model(), "other");
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::Text {
                        text: "Read this flyer".to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png".to_string(),
                            data: "AAAA".to_string(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig { temperature: 0.1 },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Read this flyer");
        assert_eq!(
            json["contents"][0]["parts"][1]["inline_data"]["mime_type"],
            "image/png"
        );
        assert!(json["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"milk\": "}, {"text": "null}"}]},
                "finishReason": "STOP"
            }],
            "modelVersion": "gemini-2.0-flash"
        }"#;
        let response: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text(), r#"{"milk": null}"#);
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.text(), "");

        let body = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let response: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text(), "");
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let backend = GeminiBackend::with_base_url("http://localhost:99999", "key", "m");
        assert!(!backend.health_check().await);
    }
}
