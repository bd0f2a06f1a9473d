use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::{
    admin_actions::InsertAdminActionEntity,
    videos::{VideoEntity, VideoStatsRow},
};

#[async_trait]
#[automock]
pub trait VideoRepository {
    async fn list_published(&self, limit: i64) -> Result<Vec<VideoEntity>>;

    async fn list_published_by_user(&self, user_id: Uuid) -> Result<Vec<VideoEntity>>;

    async fn list_stats_by_user(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<VideoStatsRow>>;

    /// Returns the new view count, or `None` when the video is not published.
    async fn increment_views(&self, video_id: Uuid) -> Result<Option<i32>>;

    async fn set_published_with_audit(
        &self,
        video_id: Uuid,
        is_published: bool,
        audit: InsertAdminActionEntity,
    ) -> Result<Option<VideoEntity>>;

    /// Returns `false` when no row matched; the audit row is only written on a hit.
    async fn delete_with_audit(&self, video_id: Uuid, audit: InsertAdminActionEntity)
    -> Result<bool>;

    async fn count_all(&self) -> Result<i64>;
}
