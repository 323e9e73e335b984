use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::{access::AccessProfile, enums::membership_statuses::MembershipStatus},
    infra::db::postgres::schema::profiles,
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = profiles)]
pub struct ProfileEntity {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub is_trainer: bool,
    pub is_admin: bool,
    pub is_guest: bool,
    pub is_member: bool,
    pub has_full_access: bool,
    pub membership_status: String,
    pub membership_tier_id: Option<Uuid>,
    pub billing_customer_id: Option<String>,
    pub billing_subscription_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileEntity {
    pub fn membership_status(&self) -> MembershipStatus {
        MembershipStatus::from_str(&self.membership_status)
    }

    /// Role and membership snapshot consumed by the access gate.
    pub fn access_profile(&self) -> AccessProfile {
        AccessProfile {
            is_trainer: self.is_trainer,
            is_admin: self.is_admin,
            has_full_access: self.has_full_access,
            // guests are never members, whatever the row says
            is_member: self.is_member && !self.is_guest,
            membership_status: self.membership_status(),
        }
    }
}

/// Guest rows are created bare: no billing references, no membership.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profiles)]
pub struct InsertGuestProfileEntity {
    pub email: String,
    pub display_name: Option<String>,
    pub is_guest: bool,
}

/// `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = profiles)]
pub struct UpdateMembershipEntity {
    pub is_member: bool,
    pub membership_status: String,
    pub membership_tier_id: Option<Uuid>,
    pub billing_customer_id: Option<String>,
    pub billing_subscription_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}
