use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{admin_actions, live_streams, stream_credentials, stream_viewers},
    },
};
use domain::{
    entities::{
        admin_actions::InsertAdminActionEntity,
        live_streams::{InsertLiveStreamEntity, LiveStreamEntity, StreamCredentialEntity},
        stream_viewers::StreamViewerEntity,
    },
    repositories::live_streams::LiveStreamRepository,
};

pub struct LiveStreamPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl LiveStreamPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl LiveStreamRepository for LiveStreamPostgres {
    async fn list_live(&self) -> Result<Vec<LiveStreamEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = live_streams::table
            .filter(live_streams::is_live.eq(true))
            .order((
                live_streams::viewer_count.desc(),
                live_streams::started_at.desc(),
            ))
            .select(LiveStreamEntity::as_select())
            .load::<LiveStreamEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_by_id(&self, stream_id: Uuid) -> Result<Option<LiveStreamEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = live_streams::table
            .filter(live_streams::id.eq(stream_id))
            .select(LiveStreamEntity::as_select())
            .first::<LiveStreamEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn start_stream(
        &self,
        stream: InsertLiveStreamEntity,
        credentials: StreamCredentialEntity,
    ) -> Result<(LiveStreamEntity, StreamCredentialEntity)> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<_, diesel::result::Error, _>(|tx| {
            let stream = insert_into(live_streams::table)
                .values(&stream)
                .returning(LiveStreamEntity::as_returning())
                .get_result::<LiveStreamEntity>(tx)?;

            let credentials = insert_into(stream_credentials::table)
                .values(&credentials)
                .returning(StreamCredentialEntity::as_returning())
                .get_result::<StreamCredentialEntity>(tx)?;

            Ok((stream, credentials))
        })?;

        Ok(result)
    }

    async fn end_stream(
        &self,
        stream_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<LiveStreamEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let result = update(live_streams::table)
            .filter(live_streams::id.eq(stream_id))
            .filter(live_streams::user_id.eq(owner_id))
            .filter(live_streams::is_live.eq(true))
            .set((
                live_streams::is_live.eq(false),
                live_streams::ended_at.eq(Some(now)),
                live_streams::updated_at.eq(now),
            ))
            .returning(LiveStreamEntity::as_returning())
            .get_result::<LiveStreamEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn end_stream_with_audit(
        &self,
        stream_id: Uuid,
        audit: InsertAdminActionEntity,
    ) -> Result<Option<LiveStreamEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let result =
            conn.transaction::<Option<LiveStreamEntity>, diesel::result::Error, _>(|tx| {
                let stream = update(live_streams::table)
                    .filter(live_streams::id.eq(stream_id))
                    .set((
                        live_streams::is_live.eq(false),
                        live_streams::ended_at.eq(Some(now)),
                        live_streams::updated_at.eq(now),
                    ))
                    .returning(LiveStreamEntity::as_returning())
                    .get_result::<LiveStreamEntity>(tx)
                    .optional()?;

                if stream.is_some() {
                    insert_into(admin_actions::table)
                        .values(&audit)
                        .execute(tx)?;
                }

                Ok(stream)
            })?;

        Ok(result)
    }

    async fn count_live(&self) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = live_streams::table
            .filter(live_streams::is_live.eq(true))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(total)
    }

    async fn join(&self, viewer: StreamViewerEntity) -> Result<StreamViewerEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<StreamViewerEntity, diesel::result::Error, _>(|tx| {
            let open_row = stream_viewers::table
                .filter(stream_viewers::stream_id.eq(viewer.stream_id))
                .filter(stream_viewers::user_id.eq(viewer.user_id))
                .filter(stream_viewers::left_at.is_null())
                .select(StreamViewerEntity::as_select())
                .first::<StreamViewerEntity>(tx)
                .optional()?;

            // Rejoining while already counted keeps the viewer count stable.
            if let Some(open_row) = open_row {
                return Ok(open_row);
            }

            let inserted = insert_into(stream_viewers::table)
                .values(&viewer)
                .returning(StreamViewerEntity::as_returning())
                .get_result::<StreamViewerEntity>(tx)?;

            update(live_streams::table)
                .filter(live_streams::id.eq(viewer.stream_id))
                .set(live_streams::viewer_count.eq(live_streams::viewer_count + 1))
                .execute(tx)?;

            Ok(inserted)
        })?;

        Ok(result)
    }

    async fn leave(&self, stream_id: Uuid, user_id: Uuid) -> Result<Option<StreamViewerEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result =
            conn.transaction::<Option<StreamViewerEntity>, diesel::result::Error, _>(|tx| {
                let closed = update(stream_viewers::table)
                    .filter(stream_viewers::stream_id.eq(stream_id))
                    .filter(stream_viewers::user_id.eq(user_id))
                    .filter(stream_viewers::left_at.is_null())
                    .set(stream_viewers::left_at.eq(Some(Utc::now())))
                    .returning(StreamViewerEntity::as_returning())
                    .get_results::<StreamViewerEntity>(tx)?;

                let Some(first) = closed.into_iter().next() else {
                    return Ok(None);
                };

                update(live_streams::table)
                    .filter(live_streams::id.eq(stream_id))
                    .filter(live_streams::viewer_count.gt(0))
                    .set(live_streams::viewer_count.eq(live_streams::viewer_count - 1))
                    .execute(tx)?;

                Ok(Some(first))
            })?;

        Ok(result)
    }
}
