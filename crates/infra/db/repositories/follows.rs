use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, delete, dsl::exists, insert_into, prelude::*, select};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::follows},
};
use domain::{entities::follows::FollowEntity, repositories::follows::FollowRepository};

pub struct FollowPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl FollowPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl FollowRepository for FollowPostgres {
    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(follows::table)
            .values(&FollowEntity {
                follower_id,
                following_id,
                created_at: Utc::now(),
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)?;

        Ok(())
    }

    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        delete(follows::table)
            .filter(follows::follower_id.eq(follower_id))
            .filter(follows::following_id.eq(following_id))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let following = select(exists(
            follows::table
                .filter(follows::follower_id.eq(follower_id))
                .filter(follows::following_id.eq(following_id)),
        ))
        .get_result::<bool>(&mut conn)?;

        Ok(following)
    }

    async fn count_followers(&self, user_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = follows::table
            .filter(follows::following_id.eq(user_id))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(total)
    }

    async fn count_following(&self, user_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = follows::table
            .filter(follows::follower_id.eq(user_id))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(total)
    }
}
