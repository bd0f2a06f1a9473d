use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::infra::db::postgres::schema::user_roles;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable, Insertable, Serialize)]
#[diesel(table_name = user_roles)]
pub struct UserRoleEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}
