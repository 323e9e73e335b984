use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::push_endpoints;

#[derive(Debug, Clone, Selectable, Queryable)]
#[diesel(table_name = push_endpoints)]
pub struct PushEndpointEntity {
    pub account_id: Uuid,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = push_endpoints)]
pub struct InsertPushEndpointEntity {
    pub account_id: Uuid,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}
