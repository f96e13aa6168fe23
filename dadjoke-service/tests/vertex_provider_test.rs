//! Vertex AI provider tests against a local httpmock server.

use dadjoke_service::config::{GenerationSettings, JokeConfig};
use dadjoke_service::handlers::joke::{PROJECT_ID, PROMPT};
use dadjoke_service::services::providers::vertex::VertexTextProvider;
use dadjoke_service::services::{GenerationError, TextProvider};
use dadjoke_service::startup::{build_text_provider, Application};
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;

const GENERATE_PATH: &str = "/v1/projects/eyalbenivri-playground/locations/us-central1/publishers/google/models/gemini-1.5-flash:generateContent";

fn config_for(server: &MockServer, extra: &[(&str, &str)]) -> JokeConfig {
    let base_url = server.base_url();
    let mut vars: Vec<(&str, &str)> = vec![("PORT", "0"), ("GENAI_ENDPOINT", base_url.as_str())];
    vars.extend_from_slice(extra);

    let vars = vars
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    JokeConfig::load_from(Some(vars)).expect("Failed to load config")
}

fn settings_for(server: &MockServer, extra: &[(&str, &str)]) -> GenerationSettings {
    config_for(server, extra).generation
}

fn expected_request() -> serde_json::Value {
    json!({
        "contents": [
            { "role": "user", "parts": [ { "text": "tell me a terrible dad joke" } ] }
        ]
    })
}

#[tokio::test]
async fn generates_text_with_static_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(GENERATE_PATH)
                .header("authorization", "Bearer static-token")
                .json_body(expected_request());
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [
                            { "text": "I used to hate facial hair, " },
                            { "text": "but then it grew on me." }
                        ]
                    },
                    "finishReason": "STOP"
                }],
                "usageMetadata": { "promptTokenCount": 7, "candidatesTokenCount": 12 }
            }));
        })
        .await;

    let settings = settings_for(&server, &[("GENAI_ACCESS_TOKEN", "static-token")]);
    let provider = VertexTextProvider::new(&settings).expect("Failed to build provider");

    let joke = provider.generate(PROMPT, PROJECT_ID).await.unwrap();

    mock.assert_async().await;
    assert_eq!(joke, "I used to hate facial hair, but then it grew on me.");
}

#[tokio::test]
async fn fetches_token_from_metadata_server() {
    let server = MockServer::start_async().await;
    let token_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/token")
                .header("metadata-flavor", "Google");
            then.status(200).json_body(json!({
                "access_token": "metadata-token",
                "expires_in": 3599,
                "token_type": "Bearer"
            }));
        })
        .await;
    let generate_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(GENERATE_PATH)
                .header("authorization", "Bearer metadata-token");
            then.status(200).json_body(json!({
                "candidates": [{ "content": { "parts": [ { "text": "joke" } ] } }]
            }));
        })
        .await;

    let metadata_url = server.url("/token");
    let settings = settings_for(&server, &[("GENAI_METADATA_URL", metadata_url.as_str())]);
    let provider = VertexTextProvider::new(&settings).expect("Failed to build provider");

    assert_eq!(provider.generate(PROMPT, PROJECT_ID).await.unwrap(), "joke");
    token_mock.assert_async().await;
    generate_mock.assert_async().await;
}

#[tokio::test]
async fn metadata_failure_is_an_auth_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/token");
            then.status(404).body("no service account");
        })
        .await;

    let metadata_url = server.url("/token");
    let settings = settings_for(&server, &[("GENAI_METADATA_URL", metadata_url.as_str())]);
    let provider = VertexTextProvider::new(&settings).expect("Failed to build provider");

    let err = provider.generate(PROMPT, PROJECT_ID).await.unwrap_err();
    assert!(matches!(err, GenerationError::Auth(_)), "got {:?}", err);
}

#[tokio::test]
async fn remote_error_message_is_surfaced() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(429).json_body(json!({
                "error": {
                    "code": 429,
                    "message": "quota exceeded",
                    "status": "RESOURCE_EXHAUSTED"
                }
            }));
        })
        .await;

    let settings = settings_for(&server, &[("GENAI_ACCESS_TOKEN", "t")]);
    let provider = VertexTextProvider::new(&settings).expect("Failed to build provider");

    let err = provider.generate(PROMPT, PROJECT_ID).await.unwrap_err();
    assert_eq!(err, GenerationError::RateLimited("quota exceeded".to_string()));
}

#[tokio::test]
async fn rejected_credentials_are_an_auth_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(401).json_body(json!({
                "error": { "code": 401, "message": "Request had invalid authentication credentials." }
            }));
        })
        .await;

    let settings = settings_for(&server, &[("GENAI_ACCESS_TOKEN", "expired")]);
    let provider = VertexTextProvider::new(&settings).expect("Failed to build provider");

    let err = provider.generate(PROMPT, PROJECT_ID).await.unwrap_err();
    assert_eq!(
        err,
        GenerationError::Auth("Request had invalid authentication credentials.".to_string())
    );
}

#[tokio::test]
async fn configured_timeout_becomes_network_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(json!({ "candidates": [] }));
        })
        .await;

    let settings = settings_for(
        &server,
        &[("GENAI_ACCESS_TOKEN", "t"), ("GENAI_TIMEOUT_SECS", "1")],
    );
    let provider = VertexTextProvider::new(&settings).expect("Failed to build provider");

    let err = provider.generate(PROMPT, PROJECT_ID).await.unwrap_err();
    assert!(matches!(err, GenerationError::Network(_)), "got {:?}", err);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_error() {
    let server = MockServer::start_async().await;
    let mut settings = settings_for(&server, &[("GENAI_ACCESS_TOKEN", "t")]);
    settings.endpoint = Some("http://127.0.0.1:1".to_string());
    let provider = VertexTextProvider::new(&settings).expect("Failed to build provider");

    let err = provider.generate(PROMPT, PROJECT_ID).await.unwrap_err();
    assert!(matches!(err, GenerationError::Network(_)), "got {:?}", err);
}

/// Full path: HTTP request in, Vertex call out, error text back.
#[tokio::test]
async fn server_renders_vertex_failure_as_error_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(GENERATE_PATH);
            then.status(500).json_body(json!({
                "error": { "code": 500, "message": "Internal error encountered." }
            }));
        })
        .await;

    let config = config_for(&server, &[("GENAI_ACCESS_TOKEN", "t")]);
    let provider = build_text_provider(&config.generation).expect("Failed to build provider");
    let app = Application::build(config, provider)
        .await
        .expect("Failed to build application");
    let port = app.port();
    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = reqwest::Client::new()
        .post(format!("http://localhost:{}/", port))
        .body("anything")
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.text().await.unwrap(),
        "error: Internal error encountered.\n"
    );
}
