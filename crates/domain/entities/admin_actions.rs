use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infra::db::postgres::schema::admin_actions;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, Serialize)]
#[diesel(table_name = admin_actions)]
pub struct AdminActionEntity {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub action: String,
    pub target_type: String,
    pub target_id: Uuid,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Audit row written in the same transaction as the privileged mutation it describes.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = admin_actions)]
pub struct InsertAdminActionEntity {
    pub admin_id: Uuid,
    pub action: String,
    pub target_type: String,
    pub target_id: Uuid,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
