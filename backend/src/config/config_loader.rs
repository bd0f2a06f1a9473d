use anyhow::{Context, Result};

use super::config_model::{
    BackendServer, Database, DotEnvyConfig, LiveStreaming, Realtime, Supabase, SupabaseStorage,
};

const DEFAULT_AVATAR_BUCKET: &str = "avatars";
const DEFAULT_INGEST_URL: &str = "rtmp://stream.example.com/live";
const DEFAULT_REALTIME_CHANNEL_CAPACITY: usize = 1024;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?.parse()?,
        body_limit: required("SERVER_BODY_LIMIT")?.parse()?,
        timeout: required("SERVER_TIMEOUT")?.parse()?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let project_url = required("SUPABASE_PROJECT_URL")?
        .trim_end_matches('/')
        .to_string();

    let storage = SupabaseStorage {
        endpoint: optional("SUPABASE_S3_ENDPOINT")
            .unwrap_or_else(|| format!("{}/storage/v1/s3", project_url)),
        region: required("SUPABASE_S3_REGION")?,
        access_key_id: required("SUPABASE_S3_ACCESS_KEY_ID")?,
        secret_access_key: required("SUPABASE_S3_SECRET_ACCESS_KEY")?,
        avatar_bucket: optional("SUPABASE_AVATAR_BUCKET")
            .unwrap_or_else(|| DEFAULT_AVATAR_BUCKET.to_string()),
    };

    let supabase = Supabase {
        project_url,
        anon_key: required("SUPABASE_ANON_KEY")?,
        jwt_secret: required("SUPABASE_JWT_SECRET")?,
        storage,
    };

    let live_streaming = LiveStreaming {
        ingest_url: optional("LIVE_INGEST_URL").unwrap_or_else(|| DEFAULT_INGEST_URL.to_string()),
    };

    let realtime = Realtime {
        channel_capacity: match optional("REALTIME_CHANNEL_CAPACITY") {
            Some(raw) => raw
                .parse()
                .context("REALTIME_CHANNEL_CAPACITY is invalid")?,
            None => DEFAULT_REALTIME_CHANNEL_CAPACITY,
        },
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        supabase,
        live_streaming,
        realtime,
    })
}

/// Read on every request by the bearer extractor, which has no access to router state.
pub fn get_supabase_jwt_secret() -> Result<String> {
    dotenvy::dotenv().ok();

    required("SUPABASE_JWT_SECRET")
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{} is invalid", key))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
