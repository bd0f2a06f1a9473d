use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

#[async_trait]
#[automock]
pub trait ObjectStorage {
    /// Stores `bytes` under `object_key` and returns the stored key.
    async fn upload(&self, object_key: String, bytes: Vec<u8>, content_type: String)
    -> Result<String>;

    fn public_url(&self, object_key: &str) -> String;
}
