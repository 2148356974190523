//! LLM Client Abstraction
//!
//! Generic interface for calling a text-generation backend that answers with
//! a JSON object. The real implementation speaks the OpenAI-compatible chat
//! completions API; the fake client is scripted for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Normally taken from the environment, never written back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Upper bound for one provider call, after which the fallback story is used
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_endpoint() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_timeout() -> u64 {
    20
}

fn default_temperature() -> f32 {
    0.8
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// LLM errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("No API key configured for the text-generation provider")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("LLM returned empty response")]
    EmptyResponse,
}

/// One chat request with a JSON-object reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

/// Generic LLM client trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Call the LLM and expect a JSON object back
    async fn call_json(&self, request: &ChatRequest) -> Result<serde_json::Value, LlmError>;
}

/// Real LLM client using the OpenAI-compatible chat completions API
pub struct HttpLlmClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn request_body(&self, request: &ChatRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": request.system_prompt},
                {"role": "user", "content": request.user_prompt},
            ],
            "response_format": {"type": "json_object"},
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn call_json(&self, request: &ChatRequest) -> Result<serde_json::Value, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let url = format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout_secs)
                } else {
                    LlmError::HttpError(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(LlmError::HttpError(format!(
                "HTTP {} from OpenAI-compatible API",
                response.status()
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidJson(format!("Failed to parse response: {}", e)))?;

        let text = extract_message_content(&response_json)?;
        tracing::debug!("LLM reply: {} bytes", text.len());

        serde_json::from_str(text)
            .map_err(|e| LlmError::InvalidJson(format!("LLM output is not valid JSON: {}", e)))
    }
}

/// Pull `choices[0].message.content` out of a chat completions reply.
fn extract_message_content(response: &serde_json::Value) -> Result<&str, LlmError> {
    response
        .get("choices")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("message"))
        .and_then(|v| v.get("content"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)
}

/// Fake LLM client for testing
pub struct FakeLlmClient {
    responses: Mutex<Vec<Result<serde_json::Value, LlmError>>>,
    requests: Mutex<Vec<ChatRequest>>,
    delay: Option<Duration>,
}

impl FakeLlmClient {
    /// Create a fake client with pre-defined responses
    pub fn new(responses: Vec<Result<serde_json::Value, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Create a fake client that always returns valid JSON
    pub fn always_valid(json: serde_json::Value) -> Self {
        Self::new(vec![Ok(json)])
    }

    /// Create a fake client that always returns an error
    pub fn always_error(error: LlmError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Sleep before answering, to exercise caller timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of calls made
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Requests seen so far, oldest first
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn call_json(&self, request: &ChatRequest) -> Result<serde_json::Value, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        match responses.len() {
            0 => Err(LlmError::EmptyResponse),
            // Keep returning the same response
            1 => responses[0].clone(),
            _ => responses.remove(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChatRequest {
        ChatRequest::new("system", "user")
    }

    #[test]
    fn test_llm_config_default() {
        let config = LlmConfig::default();
        assert_eq!(config.endpoint, "https://api.openai.com");
        assert_eq!(config.model, "gpt-4o");
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout_secs, 20);
        assert_eq!(config.max_tokens, 1000);
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = LlmConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[test]
    fn test_request_body_shape() {
        let client = HttpLlmClient::new(LlmConfig::default()).unwrap();
        let body = client.request_body(&request().with_sampling(0.5, 200));
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["max_tokens"], 200);
    }

    #[test]
    fn test_extract_message_content() {
        let reply = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"title\":\"T\"}"}}]
        });
        assert_eq!(extract_message_content(&reply).unwrap(), "{\"title\":\"T\"}");

        let empty = serde_json::json!({"choices": []});
        assert_eq!(extract_message_content(&empty), Err(LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_http_client_without_key_fails_fast() {
        let client = HttpLlmClient::new(LlmConfig::default()).unwrap();
        let result = client.call_json(&request()).await;
        assert_eq!(result, Err(LlmError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_fake_client_always_valid() {
        let json = serde_json::json!({"title": "T", "content": "C"});
        let client = FakeLlmClient::always_valid(json.clone());

        assert_eq!(client.call_json(&request()).await.unwrap(), json);
        assert_eq!(client.call_count(), 1);

        // Call again, should return same response
        assert!(client.call_json(&request()).await.is_ok());
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_fake_client_always_error() {
        let client = FakeLlmClient::always_error(LlmError::MissingApiKey);
        assert!(client.call_json(&request()).await.is_err());
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fake_client_multiple_responses() {
        let client = FakeLlmClient::new(vec![
            Ok(serde_json::json!({"response": 1})),
            Ok(serde_json::json!({"response": 2})),
            Err(LlmError::Timeout(20)),
        ]);

        assert_eq!(client.call_json(&request()).await.unwrap()["response"], 1);
        assert_eq!(client.call_json(&request()).await.unwrap()["response"], 2);
        assert!(client.call_json(&request()).await.is_err());
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fake_client_records_requests() {
        let client = FakeLlmClient::always_error(LlmError::EmptyResponse);
        let _ = client.call_json(&ChatRequest::new("sys", "tell a story")).await;
        let seen = client.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].user_prompt, "tell a story");
    }
}
