use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{delete, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::profiles},
};
use domain::{
    entities::profiles::{InsertGuestProfileEntity, ProfileEntity, UpdateMembershipEntity},
    repositories::profiles::ProfileRepository,
    value_objects::{
        enums::membership_statuses::MembershipStatus, memberships::MembershipActivation,
    },
};

diesel::define_sql_function! {
    /// Emails are matched case-insensitively, the same way the unique indexes compare them.
    fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

pub struct ProfilePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ProfilePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ProfileRepository for ProfilePostgres {
    async fn find_by_id(&self, profile_id: Uuid) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = profiles::table
            .find(profile_id)
            .select(ProfileEntity::as_select())
            .first::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_guest_by_email(
        &self,
        email: String,
        exclude_id: Option<Uuid>,
    ) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = profiles::table
            .filter(profiles::is_guest.eq(true))
            .filter(lower(profiles::email).eq(lower(email)))
            .select(ProfileEntity::as_select())
            .into_boxed();

        if let Some(exclude_id) = exclude_id {
            query = query.filter(profiles::id.ne(exclude_id));
        }

        let result = query.first::<ProfileEntity>(&mut conn).optional()?;

        Ok(result)
    }

    async fn find_registered_by_email(&self, email: String) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = profiles::table
            .filter(profiles::is_guest.eq(false))
            .filter(lower(profiles::email).eq(lower(email)))
            .select(ProfileEntity::as_select())
            .first::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn create_guest(&self, insert_guest: InsertGuestProfileEntity) -> Result<ProfileEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = insert_into(profiles::table)
            .values(&insert_guest)
            .on_conflict_do_nothing()
            .returning(ProfileEntity::as_select())
            .get_result::<ProfileEntity>(&mut conn)
            .optional()?;

        if let Some(profile) = inserted {
            return Ok(profile);
        }

        // Lost the race on the guest email index; the winner's row is the guest.
        let existing = profiles::table
            .filter(profiles::is_guest.eq(true))
            .filter(lower(profiles::email).eq(lower(&insert_guest.email)))
            .select(ProfileEntity::as_select())
            .first::<ProfileEntity>(&mut conn)?;

        Ok(existing)
    }

    async fn delete_profile(&self, profile_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        delete(profiles::table.find(profile_id)).execute(&mut conn)?;

        Ok(())
    }

    async fn activate_membership(&self, activation: MembershipActivation) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let changes = UpdateMembershipEntity {
            is_member: true,
            membership_status: MembershipStatus::Active.to_string(),
            membership_tier_id: activation.tier_id,
            billing_customer_id: activation.billing_customer_id,
            billing_subscription_id: activation.billing_subscription_id,
            updated_at: Utc::now(),
        };

        let affected = update(profiles::table)
            .filter(profiles::id.eq(activation.profile_id))
            .filter(profiles::is_guest.eq(false))
            .set(&changes)
            .execute(&mut conn)?;

        Ok(affected > 0)
    }

    async fn update_membership_by_subscription(
        &self,
        billing_subscription_id: String,
        status: MembershipStatus,
    ) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(profiles::table)
            .filter(profiles::billing_subscription_id.eq(billing_subscription_id))
            .filter(profiles::is_guest.eq(false))
            .set((
                profiles::membership_status.eq(status.to_string()),
                profiles::is_member.eq(status != MembershipStatus::Canceled),
                profiles::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }
}
