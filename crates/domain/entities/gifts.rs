use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infra::db::postgres::schema::gifts;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable, Serialize)]
#[diesel(table_name = gifts)]
pub struct GiftEntity {
    pub id: Uuid,
    pub name: String,
    pub price: i32,
    pub icon_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = gifts)]
pub struct InsertGiftEntity {
    pub id: Uuid,
    pub name: String,
    pub price: i32,
    pub icon_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Partial catalog edit; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, AsChangeset, Deserialize, Serialize)]
#[diesel(table_name = gifts)]
pub struct UpdateGiftEntity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i32>,
    #[serde(alias = "icon", skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UpdateGiftEntity {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.icon_url.is_none()
            && self.is_active.is_none()
    }
}
