use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::membership_tiers;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = membership_tiers)]
pub struct MembershipTierEntity {
    pub id: Uuid,
    pub name: String,
    pub monthly_quota: Option<i32>,
    pub price_minor: i32,
    pub billing_price_ref: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
