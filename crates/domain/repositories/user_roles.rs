use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{admin_actions::InsertAdminActionEntity, user_roles::UserRoleEntity},
    value_objects::enums::app_roles::AppRole,
};

#[async_trait]
#[automock]
pub trait UserRoleRepository {
    async fn list_roles(&self, user_id: Uuid) -> Result<Vec<UserRoleEntity>>;

    async fn has_role(&self, user_id: Uuid, role: AppRole) -> Result<bool>;

    /// Deletes every role row of `user_id`, then inserts exactly one.
    async fn replace_role_with_audit(
        &self,
        user_id: Uuid,
        role: AppRole,
        audit: InsertAdminActionEntity,
    ) -> Result<UserRoleEntity>;

    /// Returns the number of role rows deleted.
    async fn remove_roles_with_audit(
        &self,
        user_id: Uuid,
        audit: InsertAdminActionEntity,
    ) -> Result<usize>;
}
