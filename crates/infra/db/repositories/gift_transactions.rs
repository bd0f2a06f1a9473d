use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, dsl::sum, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{gift_transactions, live_streams},
    },
};
use domain::{
    entities::gift_transactions::GiftTransactionEntity,
    repositories::gift_transactions::GiftTransactionRepository,
};

pub struct GiftTransactionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl GiftTransactionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl GiftTransactionRepository for GiftTransactionPostgres {
    async fn send_gift(&self, transaction: GiftTransactionEntity) -> Result<GiftTransactionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<GiftTransactionEntity, diesel::result::Error, _>(|tx| {
            let inserted = insert_into(gift_transactions::table)
                .values(&transaction)
                .returning(GiftTransactionEntity::as_returning())
                .get_result::<GiftTransactionEntity>(tx)?;

            if let Some(stream_id) = transaction.stream_id {
                update(live_streams::table)
                    .filter(live_streams::id.eq(stream_id))
                    .set(
                        live_streams::gift_total
                            .eq(live_streams::gift_total + transaction.total_price),
                    )
                    .execute(tx)?;
            }

            Ok(inserted)
        })?;

        Ok(result)
    }

    async fn sum_received(&self, user_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = gift_transactions::table
            .filter(gift_transactions::recipient_id.eq(user_id))
            .select(sum(gift_transactions::total_price))
            .first::<Option<i64>>(&mut conn)?;

        Ok(total.unwrap_or(0))
    }

    async fn sum_all(&self) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = gift_transactions::table
            .select(sum(gift_transactions::total_price))
            .first::<Option<i64>>(&mut conn)?;

        Ok(total.unwrap_or(0))
    }
}
