use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::profiles::{ProfileEntity, ProfileSnippet, UpdateProfileEntity};

#[async_trait]
#[automock]
pub trait ProfileRepository {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<ProfileEntity>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<ProfileEntity>>;

    async fn username_taken_by_other(&self, username: &str, user_id: Uuid) -> Result<bool>;

    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: UpdateProfileEntity,
    ) -> Result<Option<ProfileEntity>>;

    async fn update_avatar(&self, user_id: Uuid, avatar_url: String)
    -> Result<Option<ProfileEntity>>;

    /// Point lookup of the display fields attached to realtime rows.
    async fn find_snippets(&self, user_ids: Vec<Uuid>) -> Result<Vec<ProfileSnippet>>;

    async fn count_all(&self) -> Result<i64>;
}
