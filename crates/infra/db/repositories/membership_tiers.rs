use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::membership_tiers::MembershipTierEntity,
        repositories::membership_tiers::MembershipTierRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::membership_tiers},
};

pub struct MembershipTierPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MembershipTierPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MembershipTierRepository for MembershipTierPostgres {
    async fn list_active(&self) -> Result<Vec<MembershipTierEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = membership_tiers::table
            .filter(membership_tiers::is_active.eq(true))
            .order(membership_tiers::price_minor.asc())
            .select(MembershipTierEntity::as_select())
            .load::<MembershipTierEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_active_by_id(&self, tier_id: Uuid) -> Result<Option<MembershipTierEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = membership_tiers::table
            .find(tier_id)
            .filter(membership_tiers::is_active.eq(true))
            .select(MembershipTierEntity::as_select())
            .first::<MembershipTierEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }
}
