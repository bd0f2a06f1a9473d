use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, delete, dsl::exists, insert_into, prelude::*, select};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{admin_actions, user_roles},
    },
};
use domain::{
    entities::{admin_actions::InsertAdminActionEntity, user_roles::UserRoleEntity},
    repositories::user_roles::UserRoleRepository,
    value_objects::enums::app_roles::AppRole,
};

pub struct UserRolePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserRolePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserRoleRepository for UserRolePostgres {
    async fn list_roles(&self, user_id: Uuid) -> Result<Vec<UserRoleEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = user_roles::table
            .filter(user_roles::user_id.eq(user_id))
            .order(user_roles::created_at.asc())
            .select(UserRoleEntity::as_select())
            .load::<UserRoleEntity>(&mut conn)?;

        Ok(results)
    }

    async fn has_role(&self, user_id: Uuid, role: AppRole) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let found = select(exists(
            user_roles::table
                .filter(user_roles::user_id.eq(user_id))
                .filter(user_roles::role.eq(role.to_string())),
        ))
        .get_result::<bool>(&mut conn)?;

        Ok(found)
    }

    async fn replace_role_with_audit(
        &self,
        user_id: Uuid,
        role: AppRole,
        audit: InsertAdminActionEntity,
    ) -> Result<UserRoleEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<UserRoleEntity, diesel::result::Error, _>(|tx| {
            delete(user_roles::table)
                .filter(user_roles::user_id.eq(user_id))
                .execute(tx)?;

            let assigned = insert_into(user_roles::table)
                .values(&UserRoleEntity {
                    id: Uuid::new_v4(),
                    user_id,
                    role: role.to_string(),
                    created_at: Utc::now(),
                })
                .returning(UserRoleEntity::as_returning())
                .get_result::<UserRoleEntity>(tx)?;

            insert_into(admin_actions::table)
                .values(&audit)
                .execute(tx)?;

            Ok(assigned)
        })?;

        Ok(result)
    }

    async fn remove_roles_with_audit(
        &self,
        user_id: Uuid,
        audit: InsertAdminActionEntity,
    ) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let removed = conn.transaction::<usize, diesel::result::Error, _>(|tx| {
            let removed = delete(user_roles::table)
                .filter(user_roles::user_id.eq(user_id))
                .execute(tx)?;

            insert_into(admin_actions::table)
                .values(&audit)
                .execute(tx)?;

            Ok(removed)
        })?;

        Ok(removed)
    }
}
