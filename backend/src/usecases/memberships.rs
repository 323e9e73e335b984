use std::{sync::Arc, time::Duration};

use anyhow::Result as AnyResult;
use crates::{
    domain::{
        repositories::{membership_tiers::MembershipTierRepository, profiles::ProfileRepository},
        value_objects::{
            enums::membership_statuses::MembershipStatus,
            error_kinds::ErrorKind,
            memberships::{ActivationStatus, MembershipActivation, MembershipTierDto},
        },
    },
    payments::stripe_client::{StripeEvent, StripeWebhooks},
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
pub trait WebhookVerifier: Send + Sync {
    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent>;
}

impl WebhookVerifier for StripeWebhooks {
    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent> {
        StripeWebhooks::verify_webhook_signature(self, payload, signature)
    }
}

#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("invalid webhook payload: {0}")]
    InvalidWebhook(String),
    #[error("profile not found")]
    ProfileNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl MembershipError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MembershipError::InvalidSignature
            | MembershipError::InvalidWebhook(_)
            | MembershipError::ProfileNotFound => ErrorKind::Validation,
            MembershipError::Internal(_) => ErrorKind::StorageFailure,
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            MembershipError::InvalidSignature | MembershipError::InvalidWebhook(_) => {
                StatusCode::BAD_REQUEST
            }
            MembershipError::ProfileNotFound => StatusCode::NOT_FOUND,
            MembershipError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied,
    Ignored,
}

/// Exponential backoff for the post-checkout activation wait.
#[derive(Debug, Clone)]
pub struct ActivationPolicy {
    pub attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl Default for ActivationPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
            multiplier: 2,
        }
    }
}

impl ActivationPolicy {
    pub fn new(attempts: u32, initial_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            initial_delay,
            ..Default::default()
        }
    }

    /// initial_delay * multiplier^attempt, capped at max_delay.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

pub struct MembershipUseCase<P, T, V>
where
    P: ProfileRepository + Send + Sync + 'static,
    T: MembershipTierRepository + Send + Sync + 'static,
    V: WebhookVerifier + 'static,
{
    profile_repository: Arc<P>,
    tier_repository: Arc<T>,
    webhook_verifier: Arc<V>,
    activation_policy: ActivationPolicy,
}

impl<P, T, V> MembershipUseCase<P, T, V>
where
    P: ProfileRepository + Send + Sync + 'static,
    T: MembershipTierRepository + Send + Sync + 'static,
    V: WebhookVerifier + 'static,
{
    pub fn new(
        profile_repository: Arc<P>,
        tier_repository: Arc<T>,
        webhook_verifier: Arc<V>,
        activation_policy: ActivationPolicy,
    ) -> Self {
        Self {
            profile_repository,
            tier_repository,
            webhook_verifier,
            activation_policy,
        }
    }

    pub async fn handle_stripe_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookOutcome, MembershipError> {
        let event = self
            .webhook_verifier
            .verify_webhook_signature(payload, signature)
            .map_err(|err| {
                warn!(error = %err, "memberships: webhook verification failed");
                MembershipError::InvalidSignature
            })?;

        info!(
            event_id = ?event.id,
            event_type = %event.type_,
            "memberships: webhook received"
        );

        match event.type_.as_str() {
            "checkout.session.completed" => self.apply_checkout(&event).await,
            "invoice.payment_succeeded" => {
                let subscription_id = invoice_subscription(&event)?;
                self.apply_status(subscription_id, MembershipStatus::Active)
                    .await
            }
            "invoice.payment_failed" => {
                let subscription_id = invoice_subscription(&event)?;
                self.apply_status(subscription_id, MembershipStatus::PastDue)
                    .await
            }
            "customer.subscription.deleted" => {
                let subscription = StripeWebhooks::extract_subscription(&event).ok_or_else(|| {
                    MembershipError::InvalidWebhook("subscription object expected".to_string())
                })?;
                self.apply_status(subscription.id, MembershipStatus::Canceled)
                    .await
            }
            other => {
                debug!(event_type = other, "memberships: ignoring webhook event");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn apply_checkout(&self, event: &StripeEvent) -> Result<WebhookOutcome, MembershipError> {
        let session = StripeWebhooks::extract_checkout_session(event).ok_or_else(|| {
            MembershipError::InvalidWebhook("checkout session object expected".to_string())
        })?;

        let metadata = session.metadata.unwrap_or_default();
        let profile_id = metadata
            .get("profile_id")
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or_else(|| MembershipError::InvalidWebhook("missing profile_id".to_string()))?;

        let tier_id = match metadata.get("tier_id") {
            Some(raw) => {
                let tier_id = Uuid::parse_str(raw)
                    .map_err(|_| MembershipError::InvalidWebhook("malformed tier_id".to_string()))?;
                if self.tier_repository.find_active_by_id(tier_id).await?.is_none() {
                    return Err(MembershipError::InvalidWebhook(format!(
                        "unknown tier {}",
                        tier_id
                    )));
                }
                Some(tier_id)
            }
            None => None,
        };

        let applied = self
            .profile_repository
            .activate_membership(MembershipActivation {
                profile_id,
                tier_id,
                billing_customer_id: session.customer,
                billing_subscription_id: session.subscription,
            })
            .await
            .map_err(|err| {
                error!(%profile_id, db_error = ?err, "memberships: activation failed");
                MembershipError::Internal(err)
            })?;

        if !applied {
            // Guests never hold billing references; missing profiles have nothing to update.
            warn!(%profile_id, "memberships: checkout target is a guest or missing, not applied");
            return Ok(WebhookOutcome::Ignored);
        }

        info!(%profile_id, tier_id = ?tier_id, "memberships: membership activated");
        Ok(WebhookOutcome::Applied)
    }

    async fn apply_status(
        &self,
        subscription_id: String,
        status: MembershipStatus,
    ) -> Result<WebhookOutcome, MembershipError> {
        let updated = self
            .profile_repository
            .update_membership_by_subscription(subscription_id.clone(), status)
            .await
            .map_err(|err| {
                error!(
                    %subscription_id,
                    %status,
                    db_error = ?err,
                    "memberships: status update failed"
                );
                MembershipError::Internal(err)
            })?;

        if updated == 0 {
            warn!(%subscription_id, %status, "memberships: no profile for subscription");
            return Ok(WebhookOutcome::Ignored);
        }

        info!(%subscription_id, %status, updated, "memberships: membership status updated");
        Ok(WebhookOutcome::Applied)
    }

    /// Re-reads the profile until the checkout webhook has landed or attempts run out.
    pub async fn await_activation(
        &self,
        profile_id: Uuid,
    ) -> Result<ActivationStatus, MembershipError> {
        let mut last_status = MembershipStatus::None;

        for attempt in 0..self.activation_policy.attempts {
            let profile = self
                .profile_repository
                .find_by_id(profile_id)
                .await?
                .ok_or(MembershipError::ProfileNotFound)?;

            let access = profile.access_profile();
            if access.is_member && access.membership_status == MembershipStatus::Active {
                info!(%profile_id, attempt, "memberships: activation observed");
                return Ok(ActivationStatus::Active);
            }
            last_status = access.membership_status;

            if attempt + 1 < self.activation_policy.attempts {
                tokio::time::sleep(self.activation_policy.delay_for_attempt(attempt)).await;
            }
        }

        info!(%profile_id, %last_status, "memberships: activation still pending");
        Ok(ActivationStatus::Pending { last_status })
    }

    pub async fn list_tiers(&self) -> Result<Vec<MembershipTierDto>, MembershipError> {
        let tiers = self.tier_repository.list_active().await.map_err(|err| {
            error!(db_error = ?err, "memberships: failed to list tiers");
            MembershipError::Internal(err)
        })?;

        Ok(tiers.into_iter().map(MembershipTierDto::from).collect())
    }
}

fn invoice_subscription(event: &StripeEvent) -> Result<String, MembershipError> {
    StripeWebhooks::extract_invoice(event)
        .and_then(|invoice| invoice.subscription)
        .ok_or_else(|| MembershipError::InvalidWebhook("invoice without subscription".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::Utc;
    use crates::{
        domain::{
            entities::{membership_tiers::MembershipTierEntity, profiles::ProfileEntity},
            repositories::{
                membership_tiers::MockMembershipTierRepository, profiles::MockProfileRepository,
            },
        },
        payments::stripe_client::StripeEventData,
    };
    use mockall::predicate::eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn event(type_: &str, object: serde_json::Value) -> StripeEvent {
        StripeEvent {
            id: Some("evt_test".to_string()),
            type_: type_.to_string(),
            created: None,
            data: StripeEventData { object },
        }
    }

    fn verifier_returning(type_: &'static str, object: serde_json::Value) -> MockWebhookVerifier {
        let mut verifier = MockWebhookVerifier::new();
        verifier
            .expect_verify_webhook_signature()
            .returning(move |_, _| Ok(event(type_, object.clone())));
        verifier
    }

    fn fast_policy(attempts: u32) -> ActivationPolicy {
        ActivationPolicy::new(attempts, Duration::from_millis(1))
    }

    fn profile(id: Uuid, is_member: bool, status: MembershipStatus) -> ProfileEntity {
        let now = Utc::now();
        ProfileEntity {
            id,
            email: "m@x.com".to_string(),
            display_name: None,
            is_trainer: false,
            is_admin: false,
            is_guest: false,
            is_member,
            has_full_access: false,
            membership_status: status.to_string(),
            membership_tier_id: None,
            billing_customer_id: None,
            billing_subscription_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn bad_signature_is_rejected() {
        let mut verifier = MockWebhookVerifier::new();
        verifier
            .expect_verify_webhook_signature()
            .returning(|_, _| Err(anyhow!("invalid webhook signature")));
        let mut profiles = MockProfileRepository::new();
        profiles.expect_activate_membership().never();

        let usecase = MembershipUseCase::new(
            Arc::new(profiles),
            Arc::new(MockMembershipTierRepository::new()),
            Arc::new(verifier),
            fast_policy(1),
        );

        let err = usecase
            .handle_stripe_webhook(b"{}", "t=1,v1=00")
            .await
            .unwrap_err();

        assert!(matches!(err, MembershipError::InvalidSignature));
    }

    #[tokio::test]
    async fn checkout_completed_activates_membership() {
        let profile_id = Uuid::new_v4();
        let tier_id = Uuid::new_v4();
        let verifier = verifier_returning(
            "checkout.session.completed",
            json!({
                "id": "cs_1",
                "customer": "cus_1",
                "subscription": "sub_1",
                "metadata": { "profile_id": profile_id.to_string(), "tier_id": tier_id.to_string() }
            }),
        );

        let mut tiers = MockMembershipTierRepository::new();
        tiers
            .expect_find_active_by_id()
            .with(eq(tier_id))
            .returning(|id| {
                let tier = MembershipTierEntity {
                    id,
                    name: "Monthly".to_string(),
                    monthly_quota: Some(8),
                    price_minor: 4900,
                    billing_price_ref: Some("price_1".to_string()),
                    is_active: true,
                    created_at: Utc::now(),
                };
                Box::pin(async move { Ok(Some(tier)) })
            });

        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_activate_membership()
            .with(eq(MembershipActivation {
                profile_id,
                tier_id: Some(tier_id),
                billing_customer_id: Some("cus_1".to_string()),
                billing_subscription_id: Some("sub_1".to_string()),
            }))
            .times(1)
            .returning(|_| Box::pin(async { Ok(true) }));

        let usecase = MembershipUseCase::new(
            Arc::new(profiles),
            Arc::new(tiers),
            Arc::new(verifier),
            fast_policy(1),
        );

        let outcome = usecase.handle_stripe_webhook(b"{}", "sig").await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Applied);
    }

    #[tokio::test]
    async fn checkout_for_guest_is_not_applied() {
        let verifier = verifier_returning(
            "checkout.session.completed",
            json!({ "metadata": { "profile_id": Uuid::new_v4().to_string() } }),
        );
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_activate_membership()
            .returning(|_| Box::pin(async { Ok(false) }));

        let usecase = MembershipUseCase::new(
            Arc::new(profiles),
            Arc::new(MockMembershipTierRepository::new()),
            Arc::new(verifier),
            fast_policy(1),
        );

        let outcome = usecase.handle_stripe_webhook(b"{}", "sig").await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Ignored);
    }

    #[tokio::test]
    async fn checkout_without_profile_is_invalid() {
        let verifier = verifier_returning(
            "checkout.session.completed",
            json!({ "metadata": {} }),
        );
        let mut profiles = MockProfileRepository::new();
        profiles.expect_activate_membership().never();

        let usecase = MembershipUseCase::new(
            Arc::new(profiles),
            Arc::new(MockMembershipTierRepository::new()),
            Arc::new(verifier),
            fast_policy(1),
        );

        let err = usecase.handle_stripe_webhook(b"{}", "sig").await.unwrap_err();

        assert!(matches!(err, MembershipError::InvalidWebhook(_)));
    }

    #[tokio::test]
    async fn subscription_events_map_to_statuses() {
        let cases = [
            (
                "invoice.payment_succeeded",
                json!({ "id": "in_1", "subscription": "sub_1" }),
                MembershipStatus::Active,
            ),
            (
                "invoice.payment_failed",
                json!({ "id": "in_2", "subscription": "sub_1" }),
                MembershipStatus::PastDue,
            ),
            (
                "customer.subscription.deleted",
                json!({ "id": "sub_1", "status": "canceled" }),
                MembershipStatus::Canceled,
            ),
        ];

        for (type_, object, expected) in cases {
            let verifier = verifier_returning(type_, object);
            let mut profiles = MockProfileRepository::new();
            profiles
                .expect_update_membership_by_subscription()
                .with(eq("sub_1".to_string()), eq(expected))
                .times(1)
                .returning(|_, _| Box::pin(async { Ok(1) }));

            let usecase = MembershipUseCase::new(
                Arc::new(profiles),
                Arc::new(MockMembershipTierRepository::new()),
                Arc::new(verifier),
                fast_policy(1),
            );

            let outcome = usecase.handle_stripe_webhook(b"{}", "sig").await.unwrap();
            assert_eq!(outcome, WebhookOutcome::Applied, "{}", type_);
        }
    }

    #[tokio::test]
    async fn unknown_events_are_ignored() {
        let verifier = verifier_returning("customer.created", json!({}));

        let usecase = MembershipUseCase::new(
            Arc::new(MockProfileRepository::new()),
            Arc::new(MockMembershipTierRepository::new()),
            Arc::new(verifier),
            fast_policy(1),
        );

        let outcome = usecase.handle_stripe_webhook(b"{}", "sig").await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Ignored);
    }

    #[tokio::test]
    async fn await_activation_returns_once_active() {
        let profile_id = Uuid::new_v4();
        let reads = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&reads);

        let mut profiles = MockProfileRepository::new();
        profiles.expect_find_by_id().returning(move |id| {
            let read = counter.fetch_add(1, Ordering::SeqCst);
            let profile = if read >= 2 {
                profile(id, true, MembershipStatus::Active)
            } else {
                profile(id, false, MembershipStatus::None)
            };
            Box::pin(async move { Ok(Some(profile)) })
        });

        let usecase = MembershipUseCase::new(
            Arc::new(profiles),
            Arc::new(MockMembershipTierRepository::new()),
            Arc::new(MockWebhookVerifier::new()),
            fast_policy(5),
        );

        let status = usecase.await_activation(profile_id).await.unwrap();

        assert_eq!(status, ActivationStatus::Active);
        assert_eq!(reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn await_activation_gives_up_after_attempts() {
        let mut profiles = MockProfileRepository::new();
        profiles.expect_find_by_id().times(3).returning(|id| {
            let profile = profile(id, false, MembershipStatus::PastDue);
            Box::pin(async move { Ok(Some(profile)) })
        });

        let usecase = MembershipUseCase::new(
            Arc::new(profiles),
            Arc::new(MockMembershipTierRepository::new()),
            Arc::new(MockWebhookVerifier::new()),
            fast_policy(3),
        );

        let status = usecase.await_activation(Uuid::new_v4()).await.unwrap();

        assert_eq!(
            status,
            ActivationStatus::Pending {
                last_status: MembershipStatus::PastDue
            }
        );
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = ActivationPolicy::new(10, Duration::from_millis(500));

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn list_tiers_maps_catalog() {
        let mut tiers = MockMembershipTierRepository::new();
        tiers.expect_list_active().returning(|| {
            let tier = MembershipTierEntity {
                id: Uuid::new_v4(),
                name: "Unlimited".to_string(),
                monthly_quota: None,
                price_minor: 9900,
                billing_price_ref: None,
                is_active: true,
                created_at: Utc::now(),
            };
            Box::pin(async move { Ok(vec![tier]) })
        });

        let usecase = MembershipUseCase::new(
            Arc::new(MockProfileRepository::new()),
            Arc::new(tiers),
            Arc::new(MockWebhookVerifier::new()),
            fast_policy(1),
        );

        let catalog = usecase.list_tiers().await.unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "Unlimited");
        assert_eq!(catalog[0].monthly_quota, None);
    }
}
