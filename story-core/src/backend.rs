//! Completion backend abstraction.
//!
//! The inference engine is an external collaborator: everything behind
//! `CompletionBackend` is opaque to the rest of the crate, which only
//! needs `complete(prompt, options) -> text`.

use crate::config::Mode;
use async_trait::async_trait;

/// Errors from a completion backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The model call itself failed.
    #[error("Model error: {0}")]
    Model(String),

    /// The backend is not ready to serve completions.
    #[error("Backend not ready: {0}")]
    NotReady(String),
}

impl From<llama::Error> for BackendError {
    fn from(err: llama::Error) -> Self {
        BackendError::Model(err.to_string())
    }
}

/// Sampling options for one completion call.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub repeat_penalty: f32,
    /// Stop sequences matching the prompt template's turn delimiters.
    pub stop: Vec<String>,
}

impl GenerationOptions {
    /// Sampling profile for chaptered story generation.
    pub fn story() -> Self {
        Self {
            max_tokens: 500,
            temperature: 0.8,
            top_p: 0.9,
            top_k: 40,
            repeat_penalty: 1.2,
            stop: ["<end_of_turn>", "<eos>", "###", "\n\n\n", "END_OF_STORY", "The end"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Sampling profile for roleplay dialogue. Hotter and with a stronger
    /// repeat penalty than story mode.
    pub fn roleplay() -> Self {
        Self {
            max_tokens: 400,
            temperature: 0.85,
            top_p: 0.92,
            top_k: 50,
            repeat_penalty: 1.3,
            stop: ["<end_of_turn>", "<eos>", "###", "\n\n", "USER:", "USER "]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// The profile for a mode.
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Story => Self::story(),
            Mode::Roleplay => Self::roleplay(),
        }
    }

    /// Override the token budget.
    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = max;
        self
    }
}

/// A service that turns prompts into completions.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generate a completion for the prompt. Blocks until the full text is
    /// available.
    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendError>;

    /// Get the backend name, for diagnostics.
    fn name(&self) -> &str;
}

/// Backend over a llama.cpp completion server.
#[derive(Clone)]
pub struct LlamaBackend {
    client: llama::Llama,
}

impl LlamaBackend {
    /// Create a backend over an existing client.
    pub fn new(client: llama::Llama) -> Self {
        Self { client }
    }

    /// Create a backend from the `LLAMA_SERVER_URL` environment variable.
    pub fn from_env() -> Self {
        Self::new(llama::Llama::from_env())
    }

    /// The server URL this backend talks to.
    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    /// Check that the server is reachable and has a model loaded.
    pub async fn health(&self) -> Result<(), BackendError> {
        self.client
            .health()
            .await
            .map_err(|e| BackendError::NotReady(e.to_string()))
    }
}

#[async_trait]
impl CompletionBackend for LlamaBackend {
    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendError> {
        let request = llama::CompletionRequest::new(prompt)
            .with_max_tokens(options.max_tokens)
            .with_temperature(options.temperature)
            .with_top_p(options.top_p)
            .with_top_k(options.top_k)
            .with_repeat_penalty(options.repeat_penalty)
            .with_stop(options.stop.clone());

        let response = self.client.complete(request).await?;
        Ok(response.content.trim().to_string())
    }

    fn name(&self) -> &str {
        "llama.cpp"
    }
}

/// Run a tiny completion to verify the backend responds before signalling
/// readiness. Returns the (trimmed) test output.
pub async fn smoke_test(backend: &dyn CompletionBackend) -> Result<String, BackendError> {
    let options = GenerationOptions {
        max_tokens: 10,
        temperature: 0.1,
        top_p: 0.9,
        top_k: 40,
        repeat_penalty: 1.1,
        stop: vec!["\n".to_string()],
    };
    backend.complete("Hello", &options).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_profiles() {
        let story = GenerationOptions::for_mode(Mode::Story);
        assert_eq!(story.max_tokens, 500);
        assert!(story.stop.contains(&"END_OF_STORY".to_string()));

        let roleplay = GenerationOptions::for_mode(Mode::Roleplay);
        assert_eq!(roleplay.max_tokens, 400);
        assert_eq!(roleplay.repeat_penalty, 1.3);
        assert!(roleplay.stop.contains(&"USER:".to_string()));
    }

    #[test]
    fn test_max_tokens_override() {
        let options = GenerationOptions::story().with_max_tokens(450);
        assert_eq!(options.max_tokens, 450);
        assert_eq!(options.temperature, 0.8);
    }

    #[test]
    fn test_backend_error_from_client_error() {
        let err: BackendError = llama::Error::Network("connection refused".to_string()).into();
        assert!(err.to_string().contains("connection refused"));
    }
}
