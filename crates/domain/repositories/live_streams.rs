use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::{
    admin_actions::InsertAdminActionEntity,
    live_streams::{InsertLiveStreamEntity, LiveStreamEntity, StreamCredentialEntity},
    stream_viewers::StreamViewerEntity,
};

#[async_trait]
#[automock]
pub trait LiveStreamRepository {
    /// Live streams ordered by viewer count, busiest first.
    async fn list_live(&self) -> Result<Vec<LiveStreamEntity>>;

    async fn find_by_id(&self, stream_id: Uuid) -> Result<Option<LiveStreamEntity>>;

    async fn start_stream(
        &self,
        stream: InsertLiveStreamEntity,
        credentials: StreamCredentialEntity,
    ) -> Result<(LiveStreamEntity, StreamCredentialEntity)>;

    /// Ends a stream owned by `owner_id`. `None` when there is no such live stream.
    async fn end_stream(&self, stream_id: Uuid, owner_id: Uuid)
    -> Result<Option<LiveStreamEntity>>;

    async fn end_stream_with_audit(
        &self,
        stream_id: Uuid,
        audit: InsertAdminActionEntity,
    ) -> Result<Option<LiveStreamEntity>>;

    async fn count_live(&self) -> Result<i64>;

    async fn join(&self, viewer: StreamViewerEntity) -> Result<StreamViewerEntity>;

    /// Closes the caller's open viewer row. `None` when they were not watching.
    async fn leave(&self, stream_id: Uuid, user_id: Uuid) -> Result<Option<StreamViewerEntity>>;
}
