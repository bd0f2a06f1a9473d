use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{infra::db::postgres::schema::messages, realtime::event_log::Keyed};

#[derive(
    Debug, Clone, PartialEq, Identifiable, Selectable, Queryable, Insertable, Serialize, Deserialize,
)]
#[diesel(table_name = messages)]
pub struct MessageEntity {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MessageEntity {
    /// The participant on the other side of the message, seen from `viewer`.
    pub fn counterpart(&self, viewer: Uuid) -> Uuid {
        if self.sender_id == viewer {
            self.recipient_id
        } else {
            self.sender_id
        }
    }

    pub fn is_between(&self, a: Uuid, b: Uuid) -> bool {
        (self.sender_id == a && self.recipient_id == b)
            || (self.sender_id == b && self.recipient_id == a)
    }
}

impl Keyed for MessageEntity {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.id
    }
}
