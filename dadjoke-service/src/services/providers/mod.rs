//! Text generation provider abstraction.
//!
//! The handler only sees [`TextProvider`]; the concrete backend (Vertex AI
//! or the mock) is picked at startup.

pub mod mock;
pub mod token;
pub mod vertex;

use async_trait::async_trait;
use thiserror::Error;

/// Failure of a generation call.
///
/// The `Display` output is what clients see after the `error: ` prefix, so
/// [`GenerationError::Remote`] renders the remote message verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("{0}")]
    Remote(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("content filtered")]
    ContentFiltered,

    #[error("generation aborted: {0}")]
    Aborted(String),
}

/// Something that turns a prompt into text, scoped to a project.
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn generate(&self, prompt: &str, project: &str) -> Result<String, GenerationError>;
}
