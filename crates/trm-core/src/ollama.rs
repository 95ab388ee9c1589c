//! Ollama API client

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::model::{ChatMessage, LanguageModel};
use crate::retry::RetryConfig;

/// Default local Ollama endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Per-request ceiling for generation calls
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2000);

const LIST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    name: String,
}

#[derive(Debug, Serialize)]
struct RequestOptions<'a> {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [&'a str]>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: RequestOptions<'a>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: RequestOptions<'a>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

/// Why a single attempt failed
#[derive(Debug)]
enum CallFailure {
    /// Timeout, connection failure or error status: worth retrying
    Transport(reqwest::Error),
    /// Anything else: retrying will not help
    Unexpected(anyhow::Error),
}

/// Ollama API client
///
/// Generation calls never return errors. Transport failures are retried with
/// linear backoff and, once exhausted, degrade to an empty string.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    timeout: Duration,
    retry: RetryConfig,
    client: reqwest::Client,
    last_error: Arc<Mutex<Option<String>>>,
}

impl OllamaClient {
    /// Create a new client bound to `model`
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryConfig::default(),
            client: reqwest::Client::new(),
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Set the per-request timeout for generation calls
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Rebind the client to another model. Only meant to be used between sessions.
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// Most recent failure seen by this client, if any
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|slot| slot.clone())
    }

    fn record_error(&self, message: String) {
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = Some(message);
        }
    }

    /// List the names of all available models. Empty on failure.
    pub async fn list_models(&self) -> Vec<String> {
        match self.fetch_models().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Error listing models");
                self.record_error(format!("Error listing models: {:#}", e));
                Vec::new()
            }
        }
    }

    async fn fetch_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let resp: TagsResponse = self
            .client
            .get(&url)
            .timeout(LIST_TIMEOUT)
            .send()
            .await
            .context("Failed to connect to Ollama")?
            .error_for_status()
            .context("Ollama rejected the models request")?
            .json()
            .await
            .context("Failed to parse models response")?;

        Ok(resp.models.into_iter().map(|m| m.name).collect())
    }

    async fn send_once<T, P>(&self, url: &str, payload: &P) -> Result<T, CallFailure>
    where
        T: DeserializeOwned,
        P: Serialize + Sync,
    {
        let response = self
            .client
            .post(url)
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(CallFailure::Transport)?;

        let body = response.bytes().await.map_err(CallFailure::Transport)?;

        serde_json::from_slice(&body).map_err(|e| {
            CallFailure::Unexpected(anyhow::Error::new(e).context("Malformed response from Ollama"))
        })
    }

    /// Post `payload` to `endpoint`, retrying transport failures.
    /// Returns `None` once retries are exhausted or on an unexpected failure.
    #[instrument(skip(self, payload), fields(model = %self.model))]
    async fn request_with_retry<T, P>(&self, endpoint: &str, payload: &P) -> Option<T>
    where
        T: DeserializeOwned,
        P: Serialize + Sync,
    {
        let url = format!("{}{}", self.base_url, endpoint);

        for attempt in 0..self.retry.retries {
            match self.send_once(&url, payload).await {
                Ok(value) => {
                    debug!(attempt = attempt + 1, "Ollama request succeeded");
                    return Some(value);
                }
                Err(CallFailure::Transport(e)) => {
                    self.record_error(format!("Ollama connection issue: {}", e));

                    if !self.retry.has_next(attempt) {
                        warn!(
                            attempt = attempt + 1,
                            retries = self.retry.retries,
                            error = %e,
                            "Ollama connection issue, giving up"
                        );
                        break;
                    }

                    let wait = self.retry.delay_for(attempt);
                    warn!(
                        attempt = attempt + 1,
                        retries = self.retry.retries,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "Ollama connection issue, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(CallFailure::Unexpected(e)) => {
                    error!(error = %format!("{:#}", e), "Unexpected error calling Ollama");
                    self.record_error(format!("Unexpected error calling Ollama: {:#}", e));
                    break;
                }
            }
        }

        None
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn generate(&self, prompt: &str, temperature: f32, stop: &[&str]) -> String {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: RequestOptions {
                temperature,
                stop: (!stop.is_empty()).then_some(stop),
            },
        };

        self.request_with_retry::<GenerateResponse, _>("/api/generate", &request)
            .await
            .map(|r| r.response.trim().to_string())
            .unwrap_or_default()
    }

    async fn chat(&self, messages: &[ChatMessage], temperature: f32) -> String {
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: RequestOptions {
                temperature,
                stop: None,
            },
        };

        self.request_with_retry::<ChatResponse, _>("/api/chat", &request)
            .await
            .and_then(|r| r.message)
            .map(|m| m.content.trim().to_string())
            .unwrap_or_default()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Instant;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_client(server: &MockServer) -> OllamaClient {
        OllamaClient::new(server.uri(), "llama3")
            .with_timeout(Duration::from_secs(5))
            .with_retry(RetryConfig::new(3).with_backoff_unit(Duration::from_millis(20)))
    }

    #[tokio::test]
    async fn test_generate_sends_contract_and_trims() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "llama3",
                "prompt": "Say hi",
                "stream": false,
                "options": { "temperature": 0.5, "stop": ["```"] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "  hi there \n" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client(&server);
        let text = client.generate("Say hi", 0.5, &["```"]).await;
        assert_eq!(text, "hi there");
        assert!(client.last_error().is_none());
    }

    #[tokio::test]
    async fn test_generate_omits_empty_stop() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "ok" })))
            .mount(&server)
            .await;

        let client = fast_client(&server);
        assert_eq!(client.generate("x", 0.5, &[]).await, "ok");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body["options"].get("stop").is_none());
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_last_attempt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "recovered" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client(&server);
        assert_eq!(client.generate("x", 0.5, &[]).await, "recovered");
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_empty_with_backoff() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let client = fast_client(&server);
        let started = Instant::now();
        let text = client.generate("x", 0.5, &[]).await;

        assert_eq!(text, "");
        // Two waits between three attempts: 20ms then 40ms
        assert!(started.elapsed() >= Duration::from_millis(60));
        assert!(client.last_error().unwrap().contains("connection issue"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("definitely not json"))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client(&server);
        assert_eq!(client.generate("x", 0.5, &[]).await, "");
        assert!(client.last_error().unwrap().contains("Unexpected error"));
    }

    #[tokio::test]
    async fn test_chat_returns_message_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "llama3",
                "messages": [{ "role": "user", "content": "hello" }],
                "stream": false
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "message": { "role": "assistant", "content": " hey " } })),
            )
            .mount(&server)
            .await;

        let client = fast_client(&server);
        let reply = client.chat(&[ChatMessage::user("hello")], 0.5).await;
        assert_eq!(reply, "hey");
    }

    #[tokio::test]
    async fn test_chat_missing_message_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = fast_client(&server);
        assert_eq!(client.chat(&[ChatMessage::user("hello")], 0.5).await, "");
    }

    #[tokio::test]
    async fn test_list_models() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{ "name": "llama3:latest" }, { "name": "qwen2.5-coder:7b" }]
            })))
            .mount(&server)
            .await;

        let client = fast_client(&server);
        assert_eq!(
            client.list_models().await,
            vec!["llama3:latest".to_string(), "qwen2.5-coder:7b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_list_models_failure_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client(&server);
        assert!(client.list_models().await.is_empty());
        assert!(client.last_error().unwrap().contains("Error listing models"));
    }

    #[test]
    fn test_set_model_between_sessions() {
        let mut client = OllamaClient::new("http://localhost:11434/", "llama3");
        assert_eq!(client.base_url(), "http://localhost:11434");
        client.set_model("mistral");
        assert_eq!(client.model(), "mistral");
        assert_eq!(client.model_name(), "mistral");
    }
}
