use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::user_settings::UserSettingsEntity;

#[async_trait]
#[automock]
pub trait UserSettingsRepository {
    async fn find(&self, user_id: Uuid) -> Result<Option<UserSettingsEntity>>;

    async fn upsert(&self, settings: UserSettingsEntity) -> Result<UserSettingsEntity>;
}
