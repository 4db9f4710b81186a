use std::{net::SocketAddr, sync::Arc};

use anyhow::{bail, Context};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waste_sorter_rs::{router, AppState, Classifier, Config, MockCorpus, OpenAiClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waste_sorter_rs=debug,tower_http=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    if config.api_key().is_none() {
        error!("OPENAI_API_KEY is not set");
        bail!("OpenAI API key not set. Please set the OPENAI_API_KEY environment variable.");
    }

    let client = OpenAiClient::from_config(&config).context("Failed to build provider client")?;
    info!(
        model = client.model(),
        timeout_secs = config.provider_timeout_secs,
        "Provider client ready"
    );

    let corpus = MockCorpus::load(&config.mock_data_path);
    let shared_state = Arc::new(AppState {
        classifier: Classifier::new(Arc::new(client), Arc::new(corpus)),
    });

    let app = router(shared_state, config.body_limit_bytes());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on http://{}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
