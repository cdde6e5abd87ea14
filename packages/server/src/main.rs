use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::DiskRegistry;
use tracing::Level;

use server::config::AppConfig;
use server::database::init_db;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    let level: Level = config
        .server
        .log_level
        .parse()
        .with_context(|| format!("invalid log level '{}'", config.server.log_level))?;
    tracing_subscriber::fmt().with_max_level(level).init();

    let db = init_db(&config.database.url)
        .await
        .context("failed to initialize database")?;
    let disks = DiskRegistry::from_config(&config.storage)
        .await
        .context("failed to initialize storage disks")?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    let state = AppState {
        db,
        disks: Arc::new(disks),
        config,
    };
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
