use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use insight_relay::{AppConfig, OllamaClient, bind_with_fallback, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Arc::new(AppConfig::load()?);
    tracing::info!(
        ollama_url = %config.ollama_url,
        model = %config.model,
        mode = ?config.response_mode,
        "starting insight relay"
    );

    let client = Arc::new(OllamaClient::new(config.as_ref())?);
    let version = client.version().await.with_context(|| {
        format!(
            "inference service at {} is not running, start it first",
            config.ollama_url
        )
    })?;
    tracing::info!(%version, "inference service is up");

    client.ensure_model().await;

    let router = build_router(config.clone(), client);

    let listener = bind_with_fallback(config.listen_addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "REST server ready");

    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,hyper=warn,axum::rejection=trace".into());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
