use std::sync::Arc;

use crates::{
    domain::{entities::videos::VideoEntity, repositories::videos::VideoRepository},
    realtime::change_feed::{ChangeEvent, ChangeFeed},
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};
use uuid::Uuid;

use super::{UseCaseError, UseCaseResult, publish_change};

pub const DEFAULT_FEED_LIMIT: i64 = 20;
pub const MAX_FEED_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
pub struct ViewCount {
    pub id: Uuid,
    pub views: i32,
}

pub struct VideoUseCase<V>
where
    V: VideoRepository + Send + Sync + 'static,
{
    video_repository: Arc<V>,
    change_feed: Arc<dyn ChangeFeed>,
}

impl<V> VideoUseCase<V>
where
    V: VideoRepository + Send + Sync + 'static,
{
    pub fn new(video_repository: Arc<V>, change_feed: Arc<dyn ChangeFeed>) -> Self {
        Self {
            video_repository,
            change_feed,
        }
    }

    /// Published videos, newest first.
    pub async fn feed(&self, limit: Option<i64>) -> UseCaseResult<Vec<VideoEntity>> {
        let limit = limit.unwrap_or(DEFAULT_FEED_LIMIT).clamp(1, MAX_FEED_LIMIT);
        let videos = self
            .video_repository
            .list_published(limit)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "videos: failed to load feed");
                err
            })?;
        Ok(videos)
    }

    pub async fn record_view(&self, video_id: Uuid) -> UseCaseResult<ViewCount> {
        let views = self
            .video_repository
            .increment_views(video_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound("Video not found".to_string()))?;

        debug!(%video_id, views, "videos: view recorded");
        publish_change(
            self.change_feed.as_ref(),
            ChangeEvent::update("videos", &json!({ "id": video_id, "views": views })),
        );

        Ok(ViewCount {
            id: video_id,
            views,
        })
    }
}
