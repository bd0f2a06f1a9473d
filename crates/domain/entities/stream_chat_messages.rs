use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infra::db::postgres::schema::stream_chat_messages;

#[derive(
    Debug, Clone, PartialEq, Identifiable, Selectable, Queryable, Insertable, Serialize, Deserialize,
)]
#[diesel(table_name = stream_chat_messages)]
pub struct StreamChatMessageEntity {
    pub id: Uuid,
    pub stream_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
