use crate::{
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
};
use anyhow::Result;
use axum::{
    Router,
    http::{
        HeaderName, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::{
    infra::{
        self,
        realtime::broadcast_feed::BroadcastChangeFeed,
        storages::supabase_storage::{SupabaseStorageClient, SupabaseStorageConfig},
        supabase::auth_client::SupabaseAuthClient,
    },
    realtime::change_feed::ChangeFeed,
};
use infra::db::postgres::postgres_connection::PgPoolSquad;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let change_feed: Arc<dyn ChangeFeed> =
        Arc::new(BroadcastChangeFeed::new(config.realtime.channel_capacity));

    let storage = &config.supabase.storage;
    let object_storage = Arc::new(
        SupabaseStorageClient::new(SupabaseStorageConfig {
            project_url: config.supabase.project_url.clone(),
            endpoint: storage.endpoint.clone(),
            region: storage.region.clone(),
            bucket: storage.avatar_bucket.clone(),
            access_key: storage.access_key_id.clone(),
            secret_key: storage.secret_access_key.clone(),
        })
        .await?,
    );
    info!(bucket = %storage.avatar_bucket, "Supabase storage client is ready");

    let auth_client = Arc::new(SupabaseAuthClient::new(
        config.supabase.project_url.clone(),
        config.supabase.anon_key.clone(),
    ));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/auth",
            routers::auth::routes(auth_client),
        )
        .nest(
            "/api/v1/profiles",
            routers::profiles::routes(
                Arc::clone(&db_pool),
                object_storage,
                Arc::clone(&change_feed),
            ),
        )
        .nest(
            "/api/v1/videos",
            routers::videos::routes(Arc::clone(&db_pool), Arc::clone(&change_feed)),
        )
        .nest(
            "/api/v1/live-streams",
            routers::live_streams::routes(
                Arc::clone(&db_pool),
                Arc::clone(&change_feed),
                config.live_streaming.ingest_url.clone(),
            ),
        )
        .nest(
            "/api/v1/gifts",
            routers::gifts::routes(Arc::clone(&db_pool), Arc::clone(&change_feed)),
        )
        .nest("/api/v1/reports", routers::reports::routes(Arc::clone(&db_pool)))
        .nest(
            "/api/v1/messages",
            routers::messages::routes(Arc::clone(&db_pool), Arc::clone(&change_feed)),
        )
        .nest("/api/v1/creator", routers::creator::routes(Arc::clone(&db_pool)))
        .nest("/api/v1/settings", routers::settings::routes(Arc::clone(&db_pool)))
        .nest("/api/v1", routers::admin::routes(Arc::clone(&db_pool)))
        .nest(
            "/functions/v1",
            routers::functions::routes(Arc::clone(&db_pool), change_feed),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    AUTHORIZATION,
                    CONTENT_TYPE,
                    HeaderName::from_static("apikey"),
                    HeaderName::from_static("x-client-info"),
                ])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install terminate signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
