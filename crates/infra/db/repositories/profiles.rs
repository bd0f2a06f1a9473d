use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, dsl::exists, prelude::*, select, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::profiles},
};
use domain::{
    entities::profiles::{ProfileEntity, ProfileSnippet, UpdateProfileEntity},
    repositories::profiles::ProfileRepository,
};

pub struct ProfilePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ProfilePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ProfileRepository for ProfilePostgres {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = profiles::table
            .filter(profiles::id.eq(user_id))
            .select(ProfileEntity::as_select())
            .first::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = profiles::table
            .filter(profiles::username.eq(username))
            .select(ProfileEntity::as_select())
            .first::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn username_taken_by_other(&self, username: &str, user_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let taken = select(exists(
            profiles::table
                .filter(profiles::username.eq(username))
                .filter(profiles::id.ne(user_id)),
        ))
        .get_result::<bool>(&mut conn)?;

        Ok(taken)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: UpdateProfileEntity,
    ) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(profiles::table)
            .filter(profiles::id.eq(user_id))
            .set(&changes)
            .returning(ProfileEntity::as_returning())
            .get_result::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn update_avatar(
        &self,
        user_id: Uuid,
        avatar_url: String,
    ) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(profiles::table)
            .filter(profiles::id.eq(user_id))
            .set((
                profiles::avatar_url.eq(Some(avatar_url)),
                profiles::updated_at.eq(Utc::now()),
            ))
            .returning(ProfileEntity::as_returning())
            .get_result::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_snippets(&self, user_ids: Vec<Uuid>) -> Result<Vec<ProfileSnippet>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = profiles::table
            .filter(profiles::id.eq_any(user_ids))
            .select(ProfileSnippet::as_select())
            .load::<ProfileSnippet>(&mut conn)?;

        Ok(results)
    }

    async fn count_all(&self) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = profiles::table.count().get_result::<i64>(&mut conn)?;

        Ok(total)
    }
}
