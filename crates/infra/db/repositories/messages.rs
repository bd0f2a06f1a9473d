use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::messages},
};
use domain::{entities::messages::MessageEntity, repositories::messages::MessageRepository};

pub struct MessagePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MessagePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MessageRepository for MessagePostgres {
    async fn list_between(&self, user_a: Uuid, user_b: Uuid) -> Result<Vec<MessageEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = messages::table
            .filter(
                messages::sender_id
                    .eq(user_a)
                    .and(messages::recipient_id.eq(user_b))
                    .or(messages::sender_id
                        .eq(user_b)
                        .and(messages::recipient_id.eq(user_a))),
            )
            .order(messages::created_at.asc())
            .select(MessageEntity::as_select())
            .load::<MessageEntity>(&mut conn)?;

        Ok(results)
    }

    async fn insert(&self, message: MessageEntity) -> Result<MessageEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(messages::table)
            .values(&message)
            .returning(MessageEntity::as_returning())
            .get_result::<MessageEntity>(&mut conn)?;

        Ok(result)
    }

    async fn list_involving(&self, user_id: Uuid, limit: i64) -> Result<Vec<MessageEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = messages::table
            .filter(
                messages::sender_id
                    .eq(user_id)
                    .or(messages::recipient_id.eq(user_id)),
            )
            .order(messages::created_at.desc())
            .limit(limit)
            .select(MessageEntity::as_select())
            .load::<MessageEntity>(&mut conn)?;

        Ok(results)
    }

    async fn mark_read(&self, recipient_id: Uuid, sender_id: Uuid) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(messages::table)
            .filter(messages::recipient_id.eq(recipient_id))
            .filter(messages::sender_id.eq(sender_id))
            .filter(messages::read_at.is_null())
            .set(messages::read_at.eq(Some(Utc::now())))
            .execute(&mut conn)?;

        Ok(updated)
    }
}
