use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infra::db::postgres::schema::profiles;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable, Serialize)]
#[diesel(table_name = profiles)]
pub struct ProfileEntity {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub instagram_url: Option<String>,
    pub youtube_url: Option<String>,
    pub twitter_url: Option<String>,
    pub website_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full replacement of the editable profile columns. `None` clears the column.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = profiles, treat_none_as_null = true)]
pub struct UpdateProfileEntity {
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub instagram_url: Option<String>,
    pub youtube_url: Option<String>,
    pub twitter_url: Option<String>,
    pub website_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// The denormalized sender fields realtime payloads lack.
#[derive(Debug, Clone, PartialEq, Selectable, Queryable, Serialize)]
#[diesel(table_name = profiles)]
pub struct ProfileSnippet {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}
