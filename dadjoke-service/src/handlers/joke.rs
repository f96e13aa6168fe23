use crate::services::GenerationError;
use crate::startup::AppState;
use axum::extract::State;
use std::sync::Arc;

/// Prompt sent on every request; request content never changes it.
pub const PROMPT: &str = "tell me a terrible dad joke";

/// Google Cloud project the generation call is scoped to.
pub const PROJECT_ID: &str = "eyalbenivri-playground";

/// Serve a freshly generated joke, whatever the method or path.
///
/// Failures are written as `error: <description>\n` with the default 200
/// status.
pub async fn tell_joke(State(state): State<AppState>) -> String {
    let provider = Arc::clone(&state.text_provider);

    // Detached from the request future: a client hanging up must not cancel
    // the outbound call.
    let generation = tokio::spawn(async move { provider.generate(PROMPT, PROJECT_ID).await });

    let result = generation
        .await
        .unwrap_or_else(|e| Err(GenerationError::Aborted(e.to_string())));

    match result {
        Ok(joke) => {
            tracing::info!(joke_len = joke.len(), "Generated joke");
            joke
        }
        Err(e) => {
            tracing::warn!(error = %e, "Joke generation failed");
            render_failure(&e)
        }
    }
}

pub fn render_failure(error: &GenerationError) -> String {
    format!("error: {}\n", error)
}
