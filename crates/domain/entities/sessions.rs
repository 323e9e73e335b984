use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::sessions;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = sessions)]
pub struct SessionEntity {
    pub id: Uuid,
    pub trainer_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub capacity: i32,
    pub location: Option<String>,
    pub session_type: String,
    pub created_at: DateTime<Utc>,
}

impl SessionEntity {
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now
    }

    pub fn is_trainer(&self, profile_id: Uuid) -> bool {
        self.trainer_id == profile_id
    }
}
