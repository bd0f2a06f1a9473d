use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infra::db::postgres::schema::videos;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable, Serialize)]
#[diesel(table_name = videos)]
pub struct VideoEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub caption: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<i32>,
    pub is_published: bool,
    pub views: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Projection used by the creator analytics and earnings views.
#[derive(Debug, Clone, PartialEq, Selectable, Queryable, Serialize)]
#[diesel(table_name = videos)]
pub struct VideoStatsRow {
    pub id: Uuid,
    pub caption: Option<String>,
    pub views: i32,
    pub created_at: DateTime<Utc>,
}
