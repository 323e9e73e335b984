use std::sync::Arc;

use crates::domain::{
    entities::profiles::{InsertGuestProfileEntity, ProfileEntity},
    repositories::{bookings::BookingRepository, profiles::ProfileRepository},
    value_objects::{emails::normalize_email, error_kinds::ErrorKind, guest_merge::MergeOutcome},
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const MAX_DISPLAY_NAME_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("invalid email: {0}")]
    InvalidEmail(String),
    #[error("email belongs to a registered account; sign in to book")]
    EmailRegistered,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl MergeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MergeError::InvalidEmail(_) | MergeError::EmailRegistered => ErrorKind::Validation,
            MergeError::Internal(_) => ErrorKind::StorageFailure,
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            MergeError::InvalidEmail(_) | MergeError::EmailRegistered => StatusCode::BAD_REQUEST,
            MergeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct GuestMergeUseCase<P, B>
where
    P: ProfileRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
{
    profile_repository: Arc<P>,
    booking_repository: Arc<B>,
}

impl<P, B> GuestMergeUseCase<P, B>
where
    P: ProfileRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
{
    pub fn new(profile_repository: Arc<P>, booking_repository: Arc<B>) -> Self {
        Self {
            profile_repository,
            booking_repository,
        }
    }

    /// Moves the same-email guest's bookings onto the authenticated profile, then
    /// retires the guest. Safe to call on every sign-in.
    pub async fn merge(
        &self,
        auth_profile_id: Uuid,
        auth_email: &str,
    ) -> Result<MergeOutcome, MergeError> {
        let email =
            normalize_email(auth_email).map_err(|err| MergeError::InvalidEmail(err.to_string()))?;

        let guest = self
            .profile_repository
            .find_guest_by_email(email, Some(auth_profile_id))
            .await
            .map_err(|err| {
                error!(%auth_profile_id, db_error = ?err, "guest_merge: guest lookup failed");
                MergeError::Internal(err)
            })?;

        let Some(guest) = guest else {
            info!(%auth_profile_id, "guest_merge: no guest profile to merge");
            return Ok(MergeOutcome::not_merged());
        };

        let transfer = self
            .booking_repository
            .reassign_client(guest.id, auth_profile_id)
            .await
            .map_err(|err| {
                error!(
                    %auth_profile_id,
                    guest_id = %guest.id,
                    db_error = ?err,
                    "guest_merge: booking transfer failed"
                );
                MergeError::Internal(err)
            })?;

        // The guest owns nothing from here on; a leftover row is retired by the next call.
        self.retire_guest(auth_profile_id, guest.id).await;

        if transfer.moved == 0 {
            info!(
                %auth_profile_id,
                guest_id = %guest.id,
                "guest_merge: guest held no bookings"
            );
            return Ok(MergeOutcome::not_merged());
        }

        info!(
            %auth_profile_id,
            guest_id = %guest.id,
            moved = transfer.moved,
            duplicates_cancelled = transfer.duplicates_cancelled,
            "guest_merge: bookings transferred"
        );

        Ok(MergeOutcome::merged(transfer.moved))
    }

    async fn retire_guest(&self, auth_profile_id: Uuid, guest_id: Uuid) {
        if let Err(err) = self.profile_repository.delete_profile(guest_id).await {
            warn!(
                %auth_profile_id,
                %guest_id,
                db_error = ?err,
                kind = %ErrorKind::BestEffortFailure,
                "guest_merge: failed to delete guest profile"
            );
        }
    }

    /// Finds or creates the guest profile behind an unauthenticated booking.
    pub async fn ensure_guest(
        &self,
        email: &str,
        display_name: Option<String>,
    ) -> Result<ProfileEntity, MergeError> {
        let email =
            normalize_email(email).map_err(|err| MergeError::InvalidEmail(err.to_string()))?;

        if self
            .profile_repository
            .find_registered_by_email(email.clone())
            .await?
            .is_some()
        {
            warn!("guest_merge: guest booking attempted with a registered email");
            return Err(MergeError::EmailRegistered);
        }

        if let Some(guest) = self
            .profile_repository
            .find_guest_by_email(email.clone(), None)
            .await?
        {
            return Ok(guest);
        }

        let display_name = display_name
            .map(|name| name.trim().chars().take(MAX_DISPLAY_NAME_CHARS).collect::<String>())
            .filter(|name| !name.is_empty());

        let guest = self
            .profile_repository
            .create_guest(InsertGuestProfileEntity {
                email,
                display_name,
                is_guest: true,
            })
            .await
            .map_err(|err| {
                error!(db_error = ?err, "guest_merge: failed to create guest profile");
                MergeError::Internal(err)
            })?;

        info!(guest_id = %guest.id, "guest_merge: guest profile ready");
        Ok(guest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::Utc;
    use crates::domain::{
        repositories::{bookings::MockBookingRepository, profiles::MockProfileRepository},
        value_objects::guest_merge::BookingTransfer,
    };
    use mockall::predicate::eq;
    use std::sync::{Arc, Mutex};

    fn guest_profile(id: Uuid, email: &str) -> ProfileEntity {
        let now = Utc::now();
        ProfileEntity {
            id,
            email: email.to_string(),
            display_name: Some("Guest".to_string()),
            is_trainer: false,
            is_admin: false,
            is_guest: true,
            is_member: false,
            has_full_access: false,
            membership_status: "none".to_string(),
            membership_tier_id: None,
            billing_customer_id: None,
            billing_subscription_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn merge_moves_guest_bookings_and_deletes_guest() {
        let auth_id = Uuid::new_v4();
        let guest_id = Uuid::new_v4();

        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_find_guest_by_email()
            .with(eq("a@x.com".to_string()), eq(Some(auth_id)))
            .times(1)
            .returning(move |email, _| {
                let guest = guest_profile(guest_id, &email);
                Box::pin(async move { Ok(Some(guest)) })
            });
        profiles
            .expect_delete_profile()
            .with(eq(guest_id))
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_reassign_client()
            .with(eq(guest_id), eq(auth_id))
            .times(1)
            .returning(|_, _| {
                Box::pin(async {
                    Ok(BookingTransfer {
                        moved: 2,
                        duplicates_cancelled: 0,
                    })
                })
            });

        let usecase = GuestMergeUseCase::new(Arc::new(profiles), Arc::new(bookings));

        let outcome = usecase.merge(auth_id, "A@X.com").await.unwrap();

        assert_eq!(outcome, MergeOutcome::merged(2));
    }

    #[tokio::test]
    async fn merge_without_guest_is_a_noop() {
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_find_guest_by_email()
            .returning(|_, _| Box::pin(async { Ok(None) }));
        profiles.expect_delete_profile().never();

        let mut bookings = MockBookingRepository::new();
        bookings.expect_reassign_client().never();

        let usecase = GuestMergeUseCase::new(Arc::new(profiles), Arc::new(bookings));

        let outcome = usecase.merge(Uuid::new_v4(), "a@x.com").await.unwrap();

        assert_eq!(outcome, MergeOutcome::not_merged());
    }

    #[tokio::test]
    async fn merge_twice_reports_nothing_the_second_time() {
        let auth_id = Uuid::new_v4();
        let guest_id = Uuid::new_v4();
        let guest_exists = Arc::new(Mutex::new(true));

        let mut profiles = MockProfileRepository::new();
        let lookup_flag = Arc::clone(&guest_exists);
        profiles
            .expect_find_guest_by_email()
            .times(2)
            .returning(move |email, _| {
                let guest = lookup_flag
                    .lock()
                    .unwrap()
                    .then(|| guest_profile(guest_id, &email));
                Box::pin(async move { Ok(guest) })
            });
        let delete_flag = Arc::clone(&guest_exists);
        profiles
            .expect_delete_profile()
            .times(1)
            .returning(move |_| {
                *delete_flag.lock().unwrap() = false;
                Box::pin(async { Ok(()) })
            });

        let mut bookings = MockBookingRepository::new();
        bookings.expect_reassign_client().times(1).returning(|_, _| {
            Box::pin(async {
                Ok(BookingTransfer {
                    moved: 1,
                    duplicates_cancelled: 0,
                })
            })
        });

        let usecase = GuestMergeUseCase::new(Arc::new(profiles), Arc::new(bookings));

        let first = usecase.merge(auth_id, "a@x.com").await.unwrap();
        let second = usecase.merge(auth_id, "a@x.com").await.unwrap();

        assert_eq!(first, MergeOutcome::merged(1));
        assert_eq!(second, MergeOutcome::not_merged());
    }

    #[tokio::test]
    async fn failed_guest_deletion_still_reports_merge() {
        let guest_id = Uuid::new_v4();

        let mut profiles = MockProfileRepository::new();
        profiles.expect_find_guest_by_email().returning(move |email, _| {
            let guest = guest_profile(guest_id, &email);
            Box::pin(async move { Ok(Some(guest)) })
        });
        profiles
            .expect_delete_profile()
            .returning(|_| Box::pin(async { Err(anyhow!("statement timeout")) }));

        let mut bookings = MockBookingRepository::new();
        bookings.expect_reassign_client().returning(|_, _| {
            Box::pin(async {
                Ok(BookingTransfer {
                    moved: 3,
                    duplicates_cancelled: 1,
                })
            })
        });

        let usecase = GuestMergeUseCase::new(Arc::new(profiles), Arc::new(bookings));

        let outcome = usecase.merge(Uuid::new_v4(), "a@x.com").await.unwrap();

        assert_eq!(outcome, MergeOutcome::merged(3));
    }

    #[tokio::test]
    async fn rerun_after_failed_guest_deletion_is_not_a_merge() {
        let auth_id = Uuid::new_v4();
        let guest_id = Uuid::new_v4();

        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_find_guest_by_email()
            .times(2)
            .returning(move |email, _| {
                let guest = guest_profile(guest_id, &email);
                Box::pin(async move { Ok(Some(guest)) })
            });
        profiles
            .expect_delete_profile()
            .with(eq(guest_id))
            .times(2)
            .returning(|_| Box::pin(async { Err(anyhow!("statement timeout")) }));

        let transfers = Arc::new(Mutex::new(vec![0u64, 3u64]));
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_reassign_client()
            .with(eq(guest_id), eq(auth_id))
            .times(2)
            .returning(move |_, _| {
                let moved = transfers.lock().unwrap().pop().unwrap_or(0);
                Box::pin(async move {
                    Ok(BookingTransfer {
                        moved,
                        duplicates_cancelled: 0,
                    })
                })
            });

        let usecase = GuestMergeUseCase::new(Arc::new(profiles), Arc::new(bookings));

        let first = usecase.merge(auth_id, "a@x.com").await.unwrap();
        let second = usecase.merge(auth_id, "a@x.com").await.unwrap();

        assert_eq!(first, MergeOutcome::merged(3));
        assert_eq!(second, MergeOutcome::not_merged());
    }

    #[tokio::test]
    async fn failed_transfer_keeps_guest() {
        let mut profiles = MockProfileRepository::new();
        profiles.expect_find_guest_by_email().returning(|email, _| {
            let guest = guest_profile(Uuid::new_v4(), &email);
            Box::pin(async move { Ok(Some(guest)) })
        });
        profiles.expect_delete_profile().never();

        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_reassign_client()
            .returning(|_, _| Box::pin(async { Err(anyhow!("deadlock detected")) }));

        let usecase = GuestMergeUseCase::new(Arc::new(profiles), Arc::new(bookings));

        let err = usecase.merge(Uuid::new_v4(), "a@x.com").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::StorageFailure);
    }

    #[tokio::test]
    async fn ensure_guest_rejects_registered_email() {
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_find_registered_by_email()
            .with(eq("member@x.com".to_string()))
            .returning(|email| {
                let mut profile = guest_profile(Uuid::new_v4(), &email);
                profile.is_guest = false;
                Box::pin(async move { Ok(Some(profile)) })
            });
        profiles.expect_create_guest().never();

        let usecase =
            GuestMergeUseCase::new(Arc::new(profiles), Arc::new(MockBookingRepository::new()));

        let err = usecase
            .ensure_guest(" Member@X.com ", None)
            .await
            .unwrap_err();

        assert!(matches!(err, MergeError::EmailRegistered));
    }

    #[tokio::test]
    async fn ensure_guest_reuses_existing_guest() {
        let guest_id = Uuid::new_v4();
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_find_registered_by_email()
            .returning(|_| Box::pin(async { Ok(None) }));
        profiles
            .expect_find_guest_by_email()
            .with(eq("g@x.com".to_string()), eq(None::<Uuid>))
            .returning(move |email, _| {
                let guest = guest_profile(guest_id, &email);
                Box::pin(async move { Ok(Some(guest)) })
            });
        profiles.expect_create_guest().never();

        let usecase =
            GuestMergeUseCase::new(Arc::new(profiles), Arc::new(MockBookingRepository::new()));

        let guest = usecase.ensure_guest("g@x.com", None).await.unwrap();

        assert_eq!(guest.id, guest_id);
    }

    #[tokio::test]
    async fn ensure_guest_creates_with_trimmed_name() {
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_find_registered_by_email()
            .returning(|_| Box::pin(async { Ok(None) }));
        profiles
            .expect_find_guest_by_email()
            .returning(|_, _| Box::pin(async { Ok(None) }));
        profiles
            .expect_create_guest()
            .withf(|insert| {
                insert.email == "new@x.com"
                    && insert.is_guest
                    && insert.display_name.as_deref() == Some("Sam")
            })
            .times(1)
            .returning(|insert| {
                let guest = guest_profile(Uuid::new_v4(), &insert.email);
                Box::pin(async move { Ok(guest) })
            });

        let usecase =
            GuestMergeUseCase::new(Arc::new(profiles), Arc::new(MockBookingRepository::new()));

        let guest = usecase
            .ensure_guest("NEW@x.com", Some("  Sam ".to_string()))
            .await
            .unwrap();

        assert!(guest.is_guest);
    }

    #[tokio::test]
    async fn invalid_email_is_rejected_before_lookup() {
        let mut profiles = MockProfileRepository::new();
        profiles.expect_find_guest_by_email().never();

        let usecase =
            GuestMergeUseCase::new(Arc::new(profiles), Arc::new(MockBookingRepository::new()));

        let err = usecase.merge(Uuid::new_v4(), "not-an-email").await.unwrap_err();

        assert!(matches!(err, MergeError::InvalidEmail(_)));
    }
}
