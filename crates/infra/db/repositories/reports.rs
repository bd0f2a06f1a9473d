use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::reports},
};
use domain::{
    entities::reports::ReportEntity, repositories::reports::ReportRepository,
    value_objects::enums::report_enums::ReportStatus,
};

pub struct ReportPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ReportPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ReportRepository for ReportPostgres {
    async fn insert(&self, report: ReportEntity) -> Result<ReportEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(reports::table)
            .values(&report)
            .returning(ReportEntity::as_returning())
            .get_result::<ReportEntity>(&mut conn)?;

        Ok(result)
    }

    async fn count_open(&self) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = reports::table
            .filter(reports::status.eq(ReportStatus::Open.to_string()))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(total)
    }
}
