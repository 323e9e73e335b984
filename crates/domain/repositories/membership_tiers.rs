use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::membership_tiers::MembershipTierEntity;

#[async_trait]
#[automock]
pub trait MembershipTierRepository {
    async fn list_active(&self) -> Result<Vec<MembershipTierEntity>>;

    async fn find_active_by_id(&self, tier_id: Uuid) -> Result<Option<MembershipTierEntity>>;
}
