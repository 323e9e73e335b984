use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::profiles::{InsertGuestProfileEntity, ProfileEntity},
    value_objects::{
        enums::membership_statuses::MembershipStatus, memberships::MembershipActivation,
    },
};

#[async_trait]
#[automock]
pub trait ProfileRepository {
    async fn find_by_id(&self, profile_id: Uuid) -> Result<Option<ProfileEntity>>;

    /// `email` must already be normalized.
    async fn find_guest_by_email(
        &self,
        email: String,
        exclude_id: Option<Uuid>,
    ) -> Result<Option<ProfileEntity>>;

    async fn find_registered_by_email(&self, email: String) -> Result<Option<ProfileEntity>>;

    /// Inserts a guest, or returns the guest that won a concurrent insert for the same email.
    async fn create_guest(&self, insert_guest: InsertGuestProfileEntity) -> Result<ProfileEntity>;

    async fn delete_profile(&self, profile_id: Uuid) -> Result<()>;

    /// Returns false when no registered profile matched.
    async fn activate_membership(&self, activation: MembershipActivation) -> Result<bool>;

    async fn update_membership_by_subscription(
        &self,
        billing_subscription_id: String,
        status: MembershipStatus,
    ) -> Result<usize>;
}
