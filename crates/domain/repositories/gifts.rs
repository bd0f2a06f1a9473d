use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::{
    admin_actions::InsertAdminActionEntity,
    gifts::{GiftEntity, InsertGiftEntity, UpdateGiftEntity},
};

#[async_trait]
#[automock]
pub trait GiftRepository {
    async fn list_active(&self) -> Result<Vec<GiftEntity>>;

    async fn list_all(&self) -> Result<Vec<GiftEntity>>;

    async fn find_by_id(&self, gift_id: Uuid) -> Result<Option<GiftEntity>>;

    async fn create_with_audit(
        &self,
        gift: InsertGiftEntity,
        audit: InsertAdminActionEntity,
    ) -> Result<GiftEntity>;

    async fn set_active_with_audit(
        &self,
        gift_id: Uuid,
        is_active: bool,
        audit: InsertAdminActionEntity,
    ) -> Result<Option<GiftEntity>>;

    async fn update_with_audit(
        &self,
        gift_id: Uuid,
        changes: UpdateGiftEntity,
        audit: InsertAdminActionEntity,
    ) -> Result<Option<GiftEntity>>;
}
