#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub supabase: Supabase,
    pub live_streaming: LiveStreaming,
    pub realtime: Realtime,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// MiB
    pub body_limit: u64,
    /// Seconds
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub project_url: String,
    pub anon_key: String,
    pub jwt_secret: String,
    pub storage: SupabaseStorage,
}

/// Credentials for the S3-compatible endpoint of Supabase Storage.
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub avatar_bucket: String,
}

#[derive(Debug, Clone)]
pub struct LiveStreaming {
    pub ingest_url: String,
}

#[derive(Debug, Clone)]
pub struct Realtime {
    pub channel_capacity: usize,
}
