use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infra::db::postgres::schema::user_settings;

#[derive(
    Debug, Clone, PartialEq, Identifiable, Selectable, Queryable, Insertable, AsChangeset, Serialize,
)]
#[diesel(primary_key(user_id))]
#[diesel(table_name = user_settings)]
pub struct UserSettingsEntity {
    pub user_id: Uuid,
    pub theme: String,
    pub autoplay_videos: bool,
    pub notification_videos: bool,
    pub notification_live: bool,
    pub notification_gifts: bool,
    pub privacy_profile: String,
    pub updated_at: DateTime<Utc>,
}
