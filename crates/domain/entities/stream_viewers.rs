use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infra::db::postgres::schema::stream_viewers;

#[derive(
    Debug, Clone, PartialEq, Identifiable, Selectable, Queryable, Insertable, Serialize, Deserialize,
)]
#[diesel(table_name = stream_viewers)]
pub struct StreamViewerEntity {
    pub id: Uuid,
    pub stream_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}
