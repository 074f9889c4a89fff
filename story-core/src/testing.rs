//! Testing utilities.
//!
//! `MockBackend` stands in for the completion server so protocol and
//! generator behavior can be tested deterministically, without a model.
//! It replays scripted completions in order and records every prompt it
//! was asked to complete.

use crate::backend::{BackendError, CompletionBackend, GenerationOptions};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A completion backend that returns scripted responses.
///
/// Clones share state: keep one handle for assertions and hand another to
/// the generator.
#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    responses: Mutex<Vec<String>>,
    next_index: Mutex<usize>,
    prompts: Mutex<Vec<String>>,
}

impl MockBackend {
    /// Create a mock with scripted responses, replayed in order.
    pub fn new(responses: Vec<impl Into<String>>) -> Self {
        Self {
            inner: Arc::new(MockState {
                responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
                next_index: Mutex::new(0),
                prompts: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Append a response to the script.
    pub fn queue_response(&self, response: impl Into<String>) {
        self.inner.responses.lock().unwrap().push(response.into());
    }

    /// Every prompt this backend has been asked to complete, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.inner.prompts.lock().unwrap().clone()
    }

    /// Number of completions served so far.
    pub fn calls(&self) -> usize {
        *self.inner.next_index.lock().unwrap()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, BackendError> {
        self.inner.prompts.lock().unwrap().push(prompt.to_string());

        let responses = self.inner.responses.lock().unwrap();
        let mut index = self.inner.next_index.lock().unwrap();

        let response = responses
            .get(*index)
            .cloned()
            .unwrap_or_else(|| "The mock model has no more scripted responses.".to_string());
        *index += 1;
        Ok(response)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A backend whose every call fails, for error-path tests.
#[derive(Clone, Default)]
pub struct FailingBackend;

#[async_trait]
impl CompletionBackend for FailingBackend {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, BackendError> {
        Err(BackendError::Model("scripted failure".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
