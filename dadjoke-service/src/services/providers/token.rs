//! OAuth access tokens for outbound Vertex AI calls.

use super::GenerationError;
use crate::config::GenerationSettings;
use reqwest::Client;
use secrecy::Secret;
use serde::Deserialize;

/// Where the bearer token for a generation call comes from.
///
/// Tokens are fetched per call; the metadata server already caches and
/// refreshes them on its side.
pub enum TokenSource {
    /// A token supplied through configuration.
    Static(Secret<String>),
    /// The instance metadata server of the runtime (Cloud Run, GCE, GKE).
    Metadata { client: Client, url: String },
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

impl TokenSource {
    pub fn from_settings(settings: &GenerationSettings, client: Client) -> Self {
        match &settings.access_token {
            Some(token) => TokenSource::Static(token.clone()),
            None => TokenSource::Metadata {
                client,
                url: settings.metadata_url.clone(),
            },
        }
    }

    pub async fn access_token(&self) -> Result<Secret<String>, GenerationError> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Metadata { client, url } => {
                let response = client
                    .get(url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(|e| {
                        GenerationError::Auth(format!("metadata server unreachable: {}", e))
                    })?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(GenerationError::Auth(format!(
                        "metadata server returned {}: {}",
                        status, body
                    )));
                }

                let token: MetadataToken = response.json().await.map_err(|e| {
                    GenerationError::Auth(format!("invalid metadata token response: {}", e))
                })?;

                Ok(Secret::new(token.access_token))
            }
        }
    }
}
