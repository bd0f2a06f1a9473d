use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::stream_chat_messages::StreamChatMessageEntity;

#[async_trait]
#[automock]
pub trait StreamChatRepository {
    /// The newest `limit` messages of a stream, returned oldest first.
    async fn list_recent(&self, stream_id: Uuid, limit: i64)
    -> Result<Vec<StreamChatMessageEntity>>;

    async fn insert(&self, message: StreamChatMessageEntity) -> Result<StreamChatMessageEntity>;

    async fn find_by_id(&self, message_id: Uuid) -> Result<Option<StreamChatMessageEntity>>;
}
