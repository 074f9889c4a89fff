//! Minimal client for a llama.cpp completion server.
//!
//! This crate provides a focused client for the `/completion` endpoint of a
//! locally running llama.cpp server:
//! - Non-streaming completions with the usual sampling knobs
//! - A `/health` probe for startup checks
//!
//! The server owns the model file; this client only speaks the HTTP API.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Environment variable naming the server base URL.
pub const BASE_URL_ENV: &str = "LLAMA_SERVER_URL";

/// Errors that can occur when talking to the completion server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// llama.cpp completion server client.
#[derive(Clone)]
pub struct Llama {
    client: reqwest::Client,
    base_url: String,
}

impl Llama {
    /// Create a new client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from the `LLAMA_SERVER_URL` environment variable,
    /// falling back to `http://127.0.0.1:8080`.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// The base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the server is up and has a model loaded.
    pub async fn health(&self) -> Result<(), Error> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        Ok(())
    }

    /// Send a completion request and return the full response.
    ///
    /// Blocks until the server has produced the entire completion; there is
    /// no token streaming.
    pub async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .client
            .post(format!("{}/completion", self.base_url))
            .headers(headers)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        response
            .json::<CompletionResponse>()
            .await
            .map_err(|e| Error::Parse(e.to_string()))
    }
}

/// A completion request in the llama.cpp server wire format.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// The raw prompt, including any turn-delimiter tokens.
    pub prompt: String,
    /// Maximum number of tokens to generate.
    #[serde(rename = "n_predict")]
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub repeat_penalty: f32,
    /// Sequences that end generation when emitted.
    pub stop: Vec<String>,
}

impl CompletionRequest {
    /// Create a request with the server's default sampling settings.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: 400,
            temperature: 0.8,
            top_p: 0.9,
            top_k: 40,
            repeat_penalty: 1.1,
            stop: Vec::new(),
        }
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = max;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set nucleus sampling top-p.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    /// Set top-k sampling.
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the repetition penalty.
    pub fn with_repeat_penalty(mut self, penalty: f32) -> Self {
        self.repeat_penalty = penalty;
        self
    }

    /// Set the stop sequences.
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }
}

/// Response from the completion endpoint.
///
/// The server returns more fields than these; only the ones this client's
/// callers use are deserialized.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    /// The generated text.
    pub content: String,
    /// Number of tokens the server predicted.
    #[serde(default)]
    pub tokens_predicted: usize,
    /// Whether generation ended on a stop word rather than token budget.
    #[serde(default)]
    pub stopped_word: bool,
}
