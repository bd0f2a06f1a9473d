use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, timeout::TimeoutConfig};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    Client,
    config::{Region, StalledStreamProtectionConfig},
    error::{ProvideErrorMetadata, SdkError},
    operation::put_object::PutObjectError,
    primitives::ByteStream,
};
use http::Uri;
use uuid::Uuid;

use crate::domain::repositories::storage::ObjectStorage;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Avatars are capped by the request body limit, so uploads finish well within this.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct SupabaseStorageConfig {
    pub project_url: String,
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

/// Public bucket on Supabase Storage, written through its S3-compatible API.
pub struct SupabaseStorageClient {
    client: Client,
    project_url: String,
    bucket: String,
}

impl SupabaseStorageClient {
    pub async fn new(config: SupabaseStorageConfig) -> Result<Self> {
        let client = connect(&config)
            .await
            .context("failed to build Supabase s3 client")?;

        Ok(Self {
            client,
            project_url: config.project_url.trim_end_matches('/').to_string(),
            bucket: config.bucket,
        })
    }
}

/// Supabase serves the S3 protocol under `/storage/v1/s3` and only understands
/// path-style addressing.
async fn connect(config: &SupabaseStorageConfig) -> Result<Client> {
    let endpoint = format!("{}/", config.endpoint.trim_end_matches('/'));
    endpoint
        .parse::<Uri>()
        .with_context(|| format!("invalid storage endpoint {}", endpoint))?;

    let credentials = Credentials::new(
        config.access_key.clone(),
        config.secret_key.clone(),
        None,
        None,
        "supabase-storage",
    );
    let region = Region::new(config.region.clone());

    let shared_config = aws_config::defaults(BehaviorVersion::latest())
        .region(region.clone())
        .credentials_provider(credentials)
        .timeout_config(
            TimeoutConfig::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .read_timeout(READ_TIMEOUT)
                .build(),
        )
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
        .endpoint_url(endpoint)
        .force_path_style(true)
        .region(region)
        .stalled_stream_protection(StalledStreamProtectionConfig::disabled())
        .build();

    Ok(Client::from_conf(s3_config))
}

/// `{user_id}/{random}.{ext}`, so every upload lands on a fresh key under the owner's folder.
pub fn avatar_object_key(user_id: Uuid, extension: &str) -> String {
    format!("{}/{}.{}", user_id, Uuid::new_v4(), extension)
}

/// File extension for an image content type, `None` for anything that is not an image.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    if !essence.starts_with("image/") {
        return None;
    }
    mime_guess::get_mime_extensions_str(essence)
        .and_then(|extensions| {
            // Prefer the short, common spelling (`jpg` over `jpe`/`jpeg`).
            extensions
                .iter()
                .copied()
                .find(|ext| *ext == "jpg")
                .or_else(|| extensions.first().copied())
        })
}

pub fn public_object_url(project_url: &str, bucket: &str, object_key: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}",
        project_url.trim_end_matches('/'),
        bucket,
        object_key.trim_start_matches('/')
    )
}

#[async_trait]
impl ObjectStorage for SupabaseStorageClient {
    async fn upload(
        &self,
        object_key: String,
        bytes: Vec<u8>,
        content_type: String,
    ) -> Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| map_put_object_error(err, &self.bucket, &object_key))?;

        Ok(object_key)
    }

    fn public_url(&self, object_key: &str) -> String {
        public_object_url(&self.project_url, &self.bucket, object_key)
    }
}

fn map_put_object_error(
    err: SdkError<PutObjectError>,
    bucket: &str,
    object_key: &str,
) -> anyhow::Error {
    if let SdkError::ServiceError(service_err) = &err {
        let raw = service_err.raw();
        let status = raw.status().as_u16();
        let code = service_err.err().code().unwrap_or("unknown");
        let message = service_err.err().message().unwrap_or_default();

        let mut detail = format!(
            "failed to upload object to Supabase Storage (status {}, code {})",
            status, code
        );
        if !message.is_empty() {
            detail.push_str(&format!(": {}", message));
        }
        detail.push_str(&format!(" [bucket={}, key={}]", bucket, object_key));

        return anyhow::anyhow!(detail);
    }

    anyhow::Error::new(err).context("failed to upload object to Supabase Storage")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_keys_live_under_the_owner_folder() {
        let user_id = Uuid::new_v4();
        let key = avatar_object_key(user_id, "png");

        let (folder, file) = key.split_once('/').unwrap();
        assert_eq!(folder, user_id.to_string());
        assert!(file.ends_with(".png"));
        assert_ne!(key, avatar_object_key(user_id, "png"));
    }

    #[test]
    fn image_extension_accepts_only_images() {
        assert_eq!(image_extension("image/png"), Some("png"));
        assert_eq!(image_extension("image/jpeg"), Some("jpg"));
        assert_eq!(image_extension("text/plain"), None);
        assert_eq!(image_extension("application/octet-stream"), None);
    }

    #[test]
    fn public_url_joins_project_bucket_and_key() {
        let url = public_object_url("https://abc.supabase.co/", "avatars", "/u/a.png");
        assert_eq!(
            url,
            "https://abc.supabase.co/storage/v1/object/public/avatars/u/a.png"
        );
    }
}
