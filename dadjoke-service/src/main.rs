use dadjoke_service::config::JokeConfig;
use dadjoke_service::startup::{build_text_provider, Application};
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = JokeConfig::load().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    let otlp_endpoint = std::env::var("OTLP_ENDPOINT")
        .ok()
        .filter(|endpoint| !endpoint.is_empty());
    init_tracing("dadjoke-service", "info", otlp_endpoint.as_deref());

    let text_provider = build_text_provider(&config.generation)?;

    let app = Application::build(config, text_provider).await?;
    app.run_until_stopped().await?;

    Ok(())
}
