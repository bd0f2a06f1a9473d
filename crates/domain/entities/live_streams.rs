use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    infra::db::postgres::schema::{live_streams, stream_credentials},
    realtime::event_log::Keyed,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable, Serialize)]
#[diesel(table_name = live_streams)]
pub struct LiveStreamEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub is_live: bool,
    pub viewer_count: i32,
    pub gift_total: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Keyed for LiveStreamEntity {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = live_streams)]
pub struct InsertLiveStreamEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_live: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable, Insertable, Serialize)]
#[diesel(table_name = stream_credentials)]
pub struct StreamCredentialEntity {
    pub id: Uuid,
    pub stream_id: Uuid,
    pub stream_key: String,
    pub stream_url: String,
    pub created_at: DateTime<Utc>,
}
