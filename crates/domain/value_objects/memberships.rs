use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    entities::membership_tiers::MembershipTierEntity,
    value_objects::enums::membership_statuses::MembershipStatus,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MembershipTierDto {
    pub id: Uuid,
    pub name: String,
    pub monthly_quota: Option<i32>,
    pub price_minor: i32,
}

impl From<MembershipTierEntity> for MembershipTierDto {
    fn from(value: MembershipTierEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            monthly_quota: value.monthly_quota,
            price_minor: value.price_minor,
        }
    }
}

/// Billing references written when a checkout completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipActivation {
    pub profile_id: Uuid,
    pub tier_id: Option<Uuid>,
    pub billing_customer_id: Option<String>,
    pub billing_subscription_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ActivationStatus {
    Active,
    /// Gave up waiting; the webhook has not landed yet.
    Pending { last_status: MembershipStatus },
}
