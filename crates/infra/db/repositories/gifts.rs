use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{admin_actions, gifts},
    },
};
use domain::{
    entities::{
        admin_actions::InsertAdminActionEntity,
        gifts::{GiftEntity, InsertGiftEntity, UpdateGiftEntity},
    },
    repositories::gifts::GiftRepository,
};

pub struct GiftPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl GiftPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl GiftRepository for GiftPostgres {
    async fn list_active(&self) -> Result<Vec<GiftEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = gifts::table
            .filter(gifts::is_active.eq(true))
            .order(gifts::price.asc())
            .select(GiftEntity::as_select())
            .load::<GiftEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_all(&self) -> Result<Vec<GiftEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = gifts::table
            .order(gifts::created_at.asc())
            .select(GiftEntity::as_select())
            .load::<GiftEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_by_id(&self, gift_id: Uuid) -> Result<Option<GiftEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = gifts::table
            .filter(gifts::id.eq(gift_id))
            .select(GiftEntity::as_select())
            .first::<GiftEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn create_with_audit(
        &self,
        gift: InsertGiftEntity,
        audit: InsertAdminActionEntity,
    ) -> Result<GiftEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<GiftEntity, diesel::result::Error, _>(|tx| {
            let created = insert_into(gifts::table)
                .values(&gift)
                .returning(GiftEntity::as_returning())
                .get_result::<GiftEntity>(tx)?;

            insert_into(admin_actions::table)
                .values(&audit)
                .execute(tx)?;

            Ok(created)
        })?;

        Ok(result)
    }

    async fn set_active_with_audit(
        &self,
        gift_id: Uuid,
        is_active: bool,
        audit: InsertAdminActionEntity,
    ) -> Result<Option<GiftEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<Option<GiftEntity>, diesel::result::Error, _>(|tx| {
            let gift = update(gifts::table)
                .filter(gifts::id.eq(gift_id))
                .set(gifts::is_active.eq(is_active))
                .returning(GiftEntity::as_returning())
                .get_result::<GiftEntity>(tx)
                .optional()?;

            if gift.is_some() {
                insert_into(admin_actions::table)
                    .values(&audit)
                    .execute(tx)?;
            }

            Ok(gift)
        })?;

        Ok(result)
    }

    async fn update_with_audit(
        &self,
        gift_id: Uuid,
        changes: UpdateGiftEntity,
        audit: InsertAdminActionEntity,
    ) -> Result<Option<GiftEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<Option<GiftEntity>, diesel::result::Error, _>(|tx| {
            let gift = update(gifts::table)
                .filter(gifts::id.eq(gift_id))
                .set(&changes)
                .returning(GiftEntity::as_returning())
                .get_result::<GiftEntity>(tx)
                .optional()?;

            if gift.is_some() {
                insert_into(admin_actions::table)
                    .values(&audit)
                    .execute(tx)?;
            }

            Ok(gift)
        })?;

        Ok(result)
    }
}
