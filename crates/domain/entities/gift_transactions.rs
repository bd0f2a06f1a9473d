use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infra::db::postgres::schema::gift_transactions;

/// Append-only ledger entry. Rows are never updated.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = gift_transactions)]
pub struct GiftTransactionEntity {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub gift_id: Uuid,
    pub stream_id: Option<Uuid>,
    pub amount: i32,
    pub total_price: i32,
    pub created_at: DateTime<Utc>,
}
