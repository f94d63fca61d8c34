//! Test utilities for grocer-core
//!
//! This module provides a mock Ollama server so the HTTP backends, prompt
//! rendering and response decoding can be exercised end-to-end without a
//! model. Replies can be computed from the prompt (the default), scripted,
//! or replaced by an HTTP error.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// How the mock answers `/api/generate`
#[derive(Debug, Clone)]
enum Behavior {
    /// Derive a plausible answer from the prompt
    Emulate,
    /// Return this text verbatim as the model response
    Reply(String),
    /// Fail with this HTTP status
    Fail(StatusCode),
    /// Accept the request and never answer
    Hang,
}

#[derive(Debug)]
struct ServerState {
    behavior: Behavior,
    prompts: Vec<String>,
}

type SharedState = Arc<Mutex<ServerState>>;

/// Mock Ollama server for testing and development
pub struct MockAiServer {
    addr: SocketAddr,
    state: SharedState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockAiServer {
    /// Start a server that answers based on the prompt content
    pub async fn start() -> Self {
        Self::start_with(Behavior::Emulate).await
    }

    /// Start a server that always returns `reply` as the model output
    pub async fn with_reply(reply: impl Into<String>) -> Self {
        Self::start_with(Behavior::Reply(reply.into())).await
    }

    /// Start a server whose generate endpoint always fails with `status`
    pub async fn failing(status: u16) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::start_with(Behavior::Fail(status)).await
    }

    /// Start a server whose generate endpoint never responds
    pub async fn hanging() -> Self {
        Self::start_with(Behavior::Hang).await
    }

    async fn start_with(behavior: Behavior) -> Self {
        let state = Arc::new(Mutex::new(ServerState {
            behavior,
            prompts: Vec::new(),
        }));

        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Prompts received by the generate endpoint, in arrival order
    pub fn prompts(&self) -> Vec<String> {
        self.state.lock().unwrap().prompts.clone()
    }

    /// Number of generate calls received
    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().prompts.len()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockAiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2026-01-01T00:00:00Z".to_string(),
            size: 2_000_000_000,
        }],
    })
}

/// Ollama generate endpoint
async fn handle_generate(
    State(state): State<SharedState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, StatusCode> {
    let behavior = {
        let mut state = state.lock().unwrap();
        state.prompts.push(request.prompt.clone());
        state.behavior.clone()
    };

    let response = match behavior {
        Behavior::Fail(status) => return Err(status),
        Behavior::Hang => {
            std::future::pending::<()>().await;
            return Err(StatusCode::GATEWAY_TIMEOUT);
        }
        Behavior::Reply(text) => text,
        Behavior::Emulate => emulate(&request),
    };

    Ok(Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    }))
}

/// Answer a prompt the way a well-behaved model would
///
/// These markers match the prompt files in prompts/*.md
fn emulate(request: &GenerateRequest) -> String {
    if !request.images.is_empty() {
        return flyer_mock();
    }
    if let Some(items) = json_line::<Vec<String>>(&request.prompt, "Requested items: ") {
        let catalog =
            json_line::<Vec<String>>(&request.prompt, "Catalog products: ").unwrap_or_default();
        return match_mock(&items, &catalog);
    }
    if request.prompt.contains("Meal: \"") {
        return meal_mock();
    }
    "Sorry, I can't help with that.".to_string()
}

/// Decode the JSON that follows `prefix` on a prompt line
fn json_line<T: serde::de::DeserializeOwned>(prompt: &str, prefix: &str) -> Option<T> {
    prompt
        .lines()
        .find_map(|line| line.trim().strip_prefix(prefix))
        .and_then(|json| serde_json::from_str(json).ok())
}

/// Match by substring, wrapped in a code fence like chatty models do
fn match_mock(items: &[String], catalog: &[String]) -> String {
    let mut matches = serde_json::Map::new();
    for item in items {
        let needle = item.to_lowercase();
        let found = catalog
            .iter()
            .find(|name| name.to_lowercase().contains(&needle))
            .map(|name| serde_json::Value::String(name.clone()))
            .unwrap_or(serde_json::Value::Null);
        matches.insert(item.clone(), found);
    }
    format!(
        "```json\n{}\n```",
        serde_json::Value::Object(matches)
    )
}

fn meal_mock() -> String {
    r#"["spaghetti", "lean ground beef", "pasta sauce", "garlic", "onions"]"#.to_string()
}

fn flyer_mock() -> String {
    r#"```json
[
  {"product_name": "Chicken Breast Boneless Skinless", "sale_price": 4.98, "regular_price": 6.99, "unit": "per lb", "brand": null},
  {"product_name": "Old Cheddar Cheese 400g", "sale_price": 5.00, "regular_price": 6.49, "unit": "each", "brand": "Black Diamond"},
  {"product_name": "Scratch & Win Contest", "sale_price": 0, "regular_price": null, "unit": null, "brand": null}
]
```"#
        .to_string()
}

// Request/Response types for the Ollama API

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(default)]
    images: Vec<String>,
    #[allow(dead_code)]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIBackend, OllamaBackend};

    #[tokio::test]
    async fn test_mock_server_health() {
        let server = MockAiServer::start().await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");
        assert!(backend.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_server_matches_products() {
        let server = MockAiServer::start().await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");

        let phrases = vec!["milk".to_string(), "caviar".to_string()];
        let catalog = vec!["2% Milk 4L".to_string(), "Bananas".to_string()];
        let result = backend.match_products(&phrases, &catalog).await.unwrap();

        assert_eq!(result[0].product_name.as_deref(), Some("2% Milk 4L"));
        assert_eq!(result[1].product_name, None);
        assert_eq!(server.request_count(), 1);
        assert!(server.prompts()[0].contains(r#"Requested items: ["milk","caviar"]"#));
    }

    #[tokio::test]
    async fn test_mock_server_flyer_drops_zero_price() {
        let server = MockAiServer::start().await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2-vision");
        let deals = backend.parse_flyer(b"\xff\xd8\xff", "FreshCo").await.unwrap();
        assert_eq!(deals.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_server_failing() {
        let server = MockAiServer::failing(503).await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");
        assert!(backend.expand_meal("tacos").await.is_err());
    }
}
