use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::stream_chat_messages},
};
use domain::{
    entities::stream_chat_messages::StreamChatMessageEntity,
    repositories::stream_chat::StreamChatRepository,
};

pub struct StreamChatPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl StreamChatPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl StreamChatRepository for StreamChatPostgres {
    async fn list_recent(
        &self,
        stream_id: Uuid,
        limit: i64,
    ) -> Result<Vec<StreamChatMessageEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut results = stream_chat_messages::table
            .filter(stream_chat_messages::stream_id.eq(stream_id))
            .order(stream_chat_messages::created_at.desc())
            .limit(limit)
            .select(StreamChatMessageEntity::as_select())
            .load::<StreamChatMessageEntity>(&mut conn)?;
        results.reverse();

        Ok(results)
    }

    async fn insert(&self, message: StreamChatMessageEntity) -> Result<StreamChatMessageEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(stream_chat_messages::table)
            .values(&message)
            .returning(StreamChatMessageEntity::as_returning())
            .get_result::<StreamChatMessageEntity>(&mut conn)?;

        Ok(result)
    }

    async fn find_by_id(&self, message_id: Uuid) -> Result<Option<StreamChatMessageEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = stream_chat_messages::table
            .filter(stream_chat_messages::id.eq(message_id))
            .select(StreamChatMessageEntity::as_select())
            .first::<StreamChatMessageEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }
}
