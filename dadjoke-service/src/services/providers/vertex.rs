//! Vertex AI provider implementation.
//!
//! Calls the `generateContent` method of a Google publisher model, scoped to
//! the Google Cloud project passed with each request.

use super::token::TokenSource;
use super::{GenerationError, TextProvider};
use crate::config::GenerationSettings;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Vertex AI text provider.
pub struct VertexTextProvider {
    endpoint: String,
    location: String,
    model: String,
    client: Client,
    tokens: TokenSource,
}

impl VertexTextProvider {
    pub fn new(settings: &GenerationSettings) -> Result<Self, GenerationError> {
        let mut builder = Client::builder();
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| {
            GenerationError::NotConfigured(format!("failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            endpoint: settings.endpoint().trim_end_matches('/').to_string(),
            location: settings.location.clone(),
            model: settings.model.clone(),
            tokens: TokenSource::from_settings(settings, client.clone()),
            client,
        })
    }

    /// Build the `generateContent` URL for the given project.
    fn api_url(&self, project: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.endpoint, project, self.location, self.model
        )
    }
}

#[async_trait]
impl TextProvider for VertexTextProvider {
    async fn generate(&self, prompt: &str, project: &str) -> Result<String, GenerationError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![ContentPart {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let token = self.tokens.access_token().await?;
        let url = self.api_url(project);

        tracing::debug!(
            model = %self.model,
            project = %project,
            prompt_len = prompt.len(),
            "Sending request to Vertex AI"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let api_response: GenerateContentResponse = response.json().await.map_err(|e| {
            GenerationError::MalformedResponse(format!("failed to parse response: {}", e))
        })?;

        extract_text(api_response)
    }
}

/// Map a non-2xx answer onto the error taxonomy, preferring the message from
/// Google's `{"error": {"message": ...}}` envelope.
fn classify_failure(status: StatusCode, body: &str) -> GenerationError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| format!("{}: {}", status, body.trim()));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited(message),
        _ => GenerationError::Remote(message),
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        tracing::warn!(block_reason = %reason, "Prompt blocked by Vertex AI");
        return Err(GenerationError::ContentFiltered);
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::MalformedResponse("no candidates returned".to_string()))?;

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(GenerationError::ContentFiltered);
    }

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.is_empty() {
        return Err(GenerationError::MalformedResponse(
            "candidate contained no text".to_string(),
        ));
    }

    Ok(text)
}

// ============================================================================
// Vertex AI Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
