use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infra::db::postgres::schema::reports;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable, Insertable, Serialize)]
#[diesel(table_name = reports)]
pub struct ReportEntity {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_item_type: String,
    pub reported_item_id: Uuid,
    pub reason: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
