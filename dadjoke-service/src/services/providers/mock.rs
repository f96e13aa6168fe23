//! Mock provider for local runs and tests.

use super::{GenerationError, TextProvider};
use async_trait::async_trait;
use std::sync::Mutex;

/// Joke served by the mock when no canned outcome is given.
pub const MOCK_JOKE: &str = "I'm reading a book about anti-gravity. It's impossible to put down.";

/// One `generate` invocation as seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub prompt: String,
    pub project: String,
}

/// Mock text provider returning a canned outcome and recording its calls.
pub struct MockTextProvider {
    outcome: Result<String, GenerationError>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockTextProvider {
    pub fn succeeding(text: impl Into<String>) -> Self {
        Self::with_outcome(Ok(text.into()))
    }

    pub fn failing(error: GenerationError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<String, GenerationError>) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for MockTextProvider {
    fn default() -> Self {
        Self::succeeding(MOCK_JOKE)
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(&self, prompt: &str, project: &str) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(MockCall {
                prompt: prompt.to_string(),
                project: project.to_string(),
            });

        self.outcome.clone()
    }
}
