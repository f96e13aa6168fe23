use config::{Config as Cfg, Environment, Map};
use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;

/// Google Compute Engine metadata endpoint serving the default service
/// account's OAuth token.
pub const DEFAULT_METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Clone, Deserialize)]
pub struct JokeConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub generation: GenerationSettings,
}

/// Which text provider backs the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Vertex,
    Mock,
}

/// Settings read from `GENAI_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSettings {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_location")]
    pub location: String,
    /// Base URL override; defaults to the regional Vertex AI endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Static bearer token. When unset, tokens come from the metadata server.
    #[serde(default)]
    pub access_token: Option<Secret<String>>,
    #[serde(default = "default_metadata_url")]
    pub metadata_url: String,
    /// Outbound request timeout. Unset keeps the transport default (none).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_location() -> String {
    "us-central1".to_string()
}

fn default_metadata_url() -> String {
    DEFAULT_METADATA_TOKEN_URL.to_string()
}

impl GenerationSettings {
    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", self.location))
    }
}

impl JokeConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::load_from(None)
    }

    /// Load from an explicit variable map; `None` reads the process environment.
    pub fn load_from(vars: Option<Map<String, String>>) -> Result<Self, AppError> {
        let common = core_config::Config::load_from(vars.clone())?;

        let generation = Cfg::builder()
            .add_source(
                Environment::with_prefix("GENAI")
                    .prefix_separator("_")
                    .ignore_empty(true)
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?
            .try_deserialize::<GenerationSettings>()?;

        Ok(JokeConfig { common, generation })
    }
}
