use anyhow::{Context, Result};
use backend::axum_http::http_serve;
use backend::config::config_loader;
use crates::infra::db::postgres::postgres_connection;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!(error = ?error, "backend: startup failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("backend")?;

    let config = config_loader::load().context("loading backend configuration")?;
    info!(
        port = config.backend_server.port,
        supabase = %config.supabase.project_url,
        ingest = %config.live_streaming.ingest_url,
        realtime_capacity = config.realtime.channel_capacity,
        "backend: configuration loaded"
    );

    let db_pool = postgres_connection::establish_connection(&config.database.url)
        .context("connecting to the video platform database")?;
    info!("backend: database pool ready");

    info!("backend: serving HTTP and realtime routes");
    http_serve::start(Arc::new(config), Arc::new(db_pool)).await
}
