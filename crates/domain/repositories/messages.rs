use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::messages::MessageEntity;

#[async_trait]
#[automock]
pub trait MessageRepository {
    /// Every message exchanged by the pair, oldest first.
    async fn list_between(&self, user_a: Uuid, user_b: Uuid) -> Result<Vec<MessageEntity>>;

    async fn insert(&self, message: MessageEntity) -> Result<MessageEntity>;

    /// Messages involving `user_id`, newest first, bounded by `limit`.
    async fn list_involving(&self, user_id: Uuid, limit: i64) -> Result<Vec<MessageEntity>>;

    /// Stamps `read_at` on unread messages sent by `sender_id` to `recipient_id`.
    async fn mark_read(&self, recipient_id: Uuid, sender_id: Uuid) -> Result<usize>;
}
