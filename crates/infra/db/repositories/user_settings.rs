use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::user_settings},
};
use domain::{
    entities::user_settings::UserSettingsEntity,
    repositories::user_settings::UserSettingsRepository,
};

pub struct UserSettingsPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserSettingsPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserSettingsRepository for UserSettingsPostgres {
    async fn find(&self, user_id: Uuid) -> Result<Option<UserSettingsEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = user_settings::table
            .filter(user_settings::user_id.eq(user_id))
            .select(UserSettingsEntity::as_select())
            .first::<UserSettingsEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn upsert(&self, settings: UserSettingsEntity) -> Result<UserSettingsEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(user_settings::table)
            .values(&settings)
            .on_conflict(user_settings::user_id)
            .do_update()
            .set(&settings)
            .returning(UserSettingsEntity::as_returning())
            .get_result::<UserSettingsEntity>(&mut conn)?;

        Ok(result)
    }
}
