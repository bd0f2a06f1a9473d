use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::follows;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable, Insertable)]
#[diesel(primary_key(follower_id, following_id))]
#[diesel(table_name = follows)]
pub struct FollowEntity {
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub created_at: DateTime<Utc>,
}
