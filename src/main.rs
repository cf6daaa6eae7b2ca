use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use airline_membership::api::{self, AppState};
use airline_membership::config::EngineConfig;
use airline_membership::journal::JournalSink;
use airline_membership::network::NetworkState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airline_membership=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting airline membership engine");

    // ENGINE_CONFIG points at a TOML file, otherwise read the environment
    let config = match std::env::var("ENGINE_CONFIG") {
        Ok(path) => EngineConfig::from_file(&PathBuf::from(path))?,
        Err(_) => EngineConfig::load()?,
    };
    info!("Configuration loaded");

    let network = NetworkState::new(&config)?;
    let sink = config
        .journal_path
        .as_ref()
        .map(|path| JournalSink::new(path).with_retention(config.journal_retention));
    if let Some(sink) = &sink {
        sink.rotate_existing()?;
        info!("Mirroring journal to {:?}", sink.path());
    }

    let app = api::router(AppState::new(network, sink));

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
