use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use concordat_core::{NationRegistry, SaveStore};
use concordat_server::config::ServerConfig;
use concordat_server::game::GameService;
use concordat_server::http;
use concordat_server::llm::LmClient;
use concordat_server::notify::Notifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "concordat_server=info,concordat_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(?config.bind_address, ?config.data_dir, "starting server");

    let registry = Arc::new(NationRegistry::load(&config.nations_path)?);
    let store = SaveStore::open(&config.data_dir)?;
    let generator = Arc::new(
        LmClient::new(config.llm.clone()).with_debug_sink(config.debug_sink_path()),
    );
    let service = Arc::new(GameService::new(
        registry,
        store,
        generator,
        Notifier::default(),
    ));

    let app = http::router(service);
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    tracing::info!(address = %config.bind_address, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
