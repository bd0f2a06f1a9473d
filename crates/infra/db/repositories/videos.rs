use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, delete, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{admin_actions, videos},
    },
};
use domain::{
    entities::{
        admin_actions::InsertAdminActionEntity,
        videos::{VideoEntity, VideoStatsRow},
    },
    repositories::videos::VideoRepository,
};

pub struct VideoPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl VideoPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl VideoRepository for VideoPostgres {
    async fn list_published(&self, limit: i64) -> Result<Vec<VideoEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = videos::table
            .filter(videos::is_published.eq(true))
            .order(videos::created_at.desc())
            .limit(limit)
            .select(VideoEntity::as_select())
            .load::<VideoEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_published_by_user(&self, user_id: Uuid) -> Result<Vec<VideoEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = videos::table
            .filter(videos::user_id.eq(user_id))
            .filter(videos::is_published.eq(true))
            .order(videos::created_at.desc())
            .select(VideoEntity::as_select())
            .load::<VideoEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_stats_by_user(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<VideoStatsRow>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let mut query = videos::table
            .filter(videos::user_id.eq(user_id))
            .select(VideoStatsRow::as_select())
            .into_boxed();

        if let Some(since) = since {
            query = query.filter(videos::created_at.ge(since));
        }

        let results = query
            .order(videos::created_at.desc())
            .load::<VideoStatsRow>(&mut conn)?;

        Ok(results)
    }

    async fn increment_views(&self, video_id: Uuid) -> Result<Option<i32>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let views = update(videos::table)
            .filter(videos::id.eq(video_id))
            .filter(videos::is_published.eq(true))
            .set(videos::views.eq(videos::views + 1))
            .returning(videos::views)
            .get_result::<i32>(&mut conn)
            .optional()?;

        Ok(views)
    }

    async fn set_published_with_audit(
        &self,
        video_id: Uuid,
        is_published: bool,
        audit: InsertAdminActionEntity,
    ) -> Result<Option<VideoEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<Option<VideoEntity>, diesel::result::Error, _>(|tx| {
            let video = update(videos::table)
                .filter(videos::id.eq(video_id))
                .set((
                    videos::is_published.eq(is_published),
                    videos::updated_at.eq(Utc::now()),
                ))
                .returning(VideoEntity::as_returning())
                .get_result::<VideoEntity>(tx)
                .optional()?;

            if video.is_some() {
                insert_into(admin_actions::table)
                    .values(&audit)
                    .execute(tx)?;
            }

            Ok(video)
        })?;

        Ok(result)
    }

    async fn delete_with_audit(
        &self,
        video_id: Uuid,
        audit: InsertAdminActionEntity,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = conn.transaction::<bool, diesel::result::Error, _>(|tx| {
            let affected = delete(videos::table)
                .filter(videos::id.eq(video_id))
                .execute(tx)?;

            if affected == 0 {
                return Ok(false);
            }

            insert_into(admin_actions::table)
                .values(&audit)
                .execute(tx)?;

            Ok(true)
        })?;

        Ok(deleted)
    }

    async fn count_all(&self) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = videos::table.count().get_result::<i64>(&mut conn)?;

        Ok(total)
    }
}
