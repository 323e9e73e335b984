use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use crates::domain::{
    entities::{bookings::BookingEntity, sessions::SessionEntity},
    repositories::{
        bookings::BookingRepository, profiles::ProfileRepository, sessions::SessionRepository,
    },
    value_objects::{
        bookings::{BookingDto, BookingTransition},
        enums::booking_statuses::BookingStatus,
        error_kinds::ErrorKind,
        notifications::NotificationEvent,
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::notifications::NotificationSink;

pub const MAX_CANCELLATION_REASON_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("booking not found")]
    BookingNotFound,
    #[error("session not found")]
    SessionNotFound,
    #[error("not allowed to change this booking")]
    Forbidden,
    #[error("booking is {0}, only confirmed bookings can change")]
    InvalidState(String),
    #[error("session has not started yet")]
    SessionNotStarted,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::BookingNotFound
            | LifecycleError::SessionNotFound
            | LifecycleError::SessionNotStarted => ErrorKind::Validation,
            LifecycleError::Forbidden => ErrorKind::Forbidden,
            LifecycleError::InvalidState(_) => ErrorKind::Conflict,
            LifecycleError::Internal(_) => ErrorKind::StorageFailure,
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            LifecycleError::BookingNotFound | LifecycleError::SessionNotFound => {
                StatusCode::NOT_FOUND
            }
            LifecycleError::SessionNotStarted => StatusCode::BAD_REQUEST,
            LifecycleError::Forbidden => StatusCode::FORBIDDEN,
            LifecycleError::InvalidState(_) => StatusCode::CONFLICT,
            LifecycleError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct BookingLifecycleUseCase<S, P, B, N>
where
    S: SessionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    N: NotificationSink + 'static,
{
    session_repository: Arc<S>,
    profile_repository: Arc<P>,
    booking_repository: Arc<B>,
    notifier: Arc<N>,
}

impl<S, P, B, N> BookingLifecycleUseCase<S, P, B, N>
where
    S: SessionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    B: BookingRepository + Send + Sync + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(
        session_repository: Arc<S>,
        profile_repository: Arc<P>,
        booking_repository: Arc<B>,
        notifier: Arc<N>,
    ) -> Self {
        Self {
            session_repository,
            profile_repository,
            booking_repository,
            notifier,
        }
    }

    /// Client or the session's trainer may cancel.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
        reason: Option<String>,
    ) -> Result<BookingDto, LifecycleError> {
        let (booking, session) = self.load(booking_id).await?;

        let is_client = booking.client_id == actor_id;
        let is_trainer = session.is_trainer(actor_id);
        if !is_client && !is_trainer {
            warn!(%booking_id, %actor_id, "booking_lifecycle: cancel forbidden");
            return Err(LifecycleError::Forbidden);
        }

        ensure_confirmed(&booking)?;

        let reason = normalize_reason(reason);
        let updated = self
            .apply(&booking, BookingTransition::Cancel { reason }, actor_id)
            .await?;

        if is_trainer && !is_client {
            self.notifier.notify(
                booking.client_id,
                NotificationEvent::BookingCancelled {
                    booking_id,
                    session_id: booking.session_id,
                },
            );
        }

        Ok(updated)
    }

    pub async fn mark_attended(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
    ) -> Result<BookingDto, LifecycleError> {
        self.record_outcome(booking_id, actor_id, BookingTransition::Attend)
            .await
    }

    pub async fn mark_no_show(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
    ) -> Result<BookingDto, LifecycleError> {
        self.record_outcome(booking_id, actor_id, BookingTransition::NoShow)
            .await
    }

    pub async fn list_for_client(
        &self,
        client_id: Uuid,
    ) -> Result<Vec<BookingDto>, LifecycleError> {
        let bookings = self
            .booking_repository
            .list_for_client(client_id)
            .await
            .map_err(|err| {
                error!(
                    %client_id,
                    db_error = ?err,
                    "booking_lifecycle: failed to list client bookings"
                );
                LifecycleError::Internal(err)
            })?;

        Ok(bookings.into_iter().map(BookingDto::from).collect())
    }

    /// Roster view for the session's trainer or an admin.
    pub async fn list_for_session(
        &self,
        session_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Vec<BookingDto>, LifecycleError> {
        let session = self
            .session_repository
            .find_by_id(session_id)
            .await?
            .ok_or(LifecycleError::SessionNotFound)?;

        if !session.is_trainer(actor_id) {
            let is_admin = self
                .profile_repository
                .find_by_id(actor_id)
                .await?
                .is_some_and(|profile| profile.is_admin);
            if !is_admin {
                warn!(%session_id, %actor_id, "booking_lifecycle: roster forbidden");
                return Err(LifecycleError::Forbidden);
            }
        }

        let bookings = self
            .booking_repository
            .list_for_session(session_id)
            .await
            .map_err(|err| {
                error!(
                    %session_id,
                    db_error = ?err,
                    "booking_lifecycle: failed to list session bookings"
                );
                LifecycleError::Internal(err)
            })?;

        Ok(bookings.into_iter().map(BookingDto::from).collect())
    }

    async fn record_outcome(
        &self,
        booking_id: Uuid,
        actor_id: Uuid,
        transition: BookingTransition,
    ) -> Result<BookingDto, LifecycleError> {
        let (booking, session) = self.load(booking_id).await?;

        if !session.is_trainer(actor_id) {
            warn!(
                %booking_id,
                %actor_id,
                target = %transition.target_status(),
                "booking_lifecycle: only the trainer can record attendance"
            );
            return Err(LifecycleError::Forbidden);
        }

        ensure_confirmed(&booking)?;

        if !session.has_started(Utc::now()) {
            return Err(LifecycleError::SessionNotStarted);
        }

        self.apply(&booking, transition, actor_id).await
    }

    async fn load(
        &self,
        booking_id: Uuid,
    ) -> Result<(BookingEntity, SessionEntity), LifecycleError> {
        let booking = self
            .booking_repository
            .find_by_id(booking_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "booking_lifecycle: failed to load booking");
                LifecycleError::Internal(err)
            })?
            .ok_or(LifecycleError::BookingNotFound)?;

        let session = self
            .session_repository
            .find_by_id(booking.session_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "booking_lifecycle: failed to load session");
                LifecycleError::Internal(err)
            })?
            .ok_or_else(|| {
                LifecycleError::Internal(anyhow!(
                    "booking {} references a missing session",
                    booking_id
                ))
            })?;

        Ok((booking, session))
    }

    async fn apply(
        &self,
        booking: &BookingEntity,
        transition: BookingTransition,
        actor_id: Uuid,
    ) -> Result<BookingDto, LifecycleError> {
        let target = transition.target_status();
        let reason = match transition {
            BookingTransition::Cancel { reason } => reason,
            BookingTransition::Attend | BookingTransition::NoShow => None,
        };

        let updated = self
            .booking_repository
            .transition_from_confirmed(booking.id, target, reason, Utc::now())
            .await
            .map_err(|err| {
                error!(
                    booking_id = %booking.id,
                    %target,
                    db_error = ?err,
                    "booking_lifecycle: transition failed"
                );
                LifecycleError::Internal(err)
            })?;

        match updated {
            Some(updated) => {
                info!(
                    booking_id = %booking.id,
                    %actor_id,
                    %target,
                    "booking_lifecycle: booking transitioned"
                );
                Ok(BookingDto::from(updated))
            }
            // Someone else moved it out of confirmed between our read and write.
            None => {
                warn!(booking_id = %booking.id, %target, "booking_lifecycle: lost transition race");
                Err(LifecycleError::InvalidState("no longer confirmed".to_string()))
            }
        }
    }
}

fn ensure_confirmed(booking: &BookingEntity) -> Result<(), LifecycleError> {
    match booking.status() {
        Some(BookingStatus::Confirmed) => Ok(()),
        Some(status) => Err(LifecycleError::InvalidState(status.to_string())),
        None => Err(LifecycleError::InvalidState(booking.status.clone())),
    }
}

fn normalize_reason(reason: Option<String>) -> Option<String> {
    reason
        .map(|reason| reason.trim().chars().take(MAX_CANCELLATION_REASON_CHARS).collect::<String>())
        .filter(|reason| !reason.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use crates::domain::{
        entities::profiles::ProfileEntity,
        repositories::{
            bookings::MockBookingRepository, profiles::MockProfileRepository,
            sessions::MockSessionRepository,
        },
    };
    use mockall::predicate::{always, eq};

    use crate::usecases::notifications::MockNotificationSink;

    struct Fixture {
        booking: BookingEntity,
        session: SessionEntity,
    }

    impl Fixture {
        fn new(starts_at: DateTime<Utc>, status: BookingStatus) -> Self {
            let now = Utc::now();
            let session = SessionEntity {
                id: Uuid::new_v4(),
                trainer_id: Uuid::new_v4(),
                starts_at,
                duration_minutes: 45,
                capacity: 4,
                location: None,
                session_type: "personal".to_string(),
                created_at: now,
            };
            let booking = BookingEntity {
                id: Uuid::new_v4(),
                session_id: session.id,
                client_id: Uuid::new_v4(),
                status: status.to_string(),
                booked_at: now,
                cancelled_at: None,
                cancellation_reason: None,
                updated_at: now,
            };
            Self { booking, session }
        }

        fn repos(&self) -> (MockSessionRepository, MockBookingRepository) {
            let mut sessions = MockSessionRepository::new();
            let session = self.session.clone();
            sessions.expect_find_by_id().returning(move |_| {
                let session = session.clone();
                Box::pin(async move { Ok(Some(session)) })
            });

            let mut bookings = MockBookingRepository::new();
            let booking = self.booking.clone();
            bookings
                .expect_find_by_id()
                .with(eq(self.booking.id))
                .returning(move |_| {
                    let booking = booking.clone();
                    Box::pin(async move { Ok(Some(booking)) })
                });

            (sessions, bookings)
        }

        fn transitioned(&self, status: BookingStatus) -> BookingEntity {
            let mut booking = self.booking.clone();
            booking.status = status.to_string();
            if status == BookingStatus::Cancelled {
                booking.cancelled_at = Some(Utc::now());
            }
            booking
        }
    }

    fn usecase(
        sessions: MockSessionRepository,
        profiles: MockProfileRepository,
        bookings: MockBookingRepository,
        notifier: MockNotificationSink,
    ) -> BookingLifecycleUseCase<
        MockSessionRepository,
        MockProfileRepository,
        MockBookingRepository,
        MockNotificationSink,
    > {
        BookingLifecycleUseCase::new(
            Arc::new(sessions),
            Arc::new(profiles),
            Arc::new(bookings),
            Arc::new(notifier),
        )
    }

    fn silent_notifier() -> MockNotificationSink {
        let mut notifier = MockNotificationSink::new();
        notifier.expect_notify().never();
        notifier
    }

    #[tokio::test]
    async fn client_cancel_stores_trimmed_reason() {
        let fixture = Fixture::new(Utc::now() + Duration::days(2), BookingStatus::Confirmed);
        let (sessions, mut bookings) = fixture.repos();
        let cancelled = fixture.transitioned(BookingStatus::Cancelled);

        bookings
            .expect_transition_from_confirmed()
            .with(
                eq(fixture.booking.id),
                eq(BookingStatus::Cancelled),
                eq(Some("sick".to_string())),
                always(),
            )
            .times(1)
            .returning(move |_, _, _, _| {
                let cancelled = cancelled.clone();
                Box::pin(async move { Ok(Some(cancelled)) })
            });

        let usecase = usecase(sessions, MockProfileRepository::new(), bookings, silent_notifier());

        let dto = usecase
            .cancel(fixture.booking.id, fixture.booking.client_id, Some("  sick ".to_string()))
            .await
            .unwrap();

        assert_eq!(dto.status, BookingStatus::Cancelled);
        assert!(dto.cancelled_at.is_some());
    }

    #[tokio::test]
    async fn trainer_cancel_notifies_client() {
        let fixture = Fixture::new(Utc::now() + Duration::days(2), BookingStatus::Confirmed);
        let (sessions, mut bookings) = fixture.repos();
        let cancelled = fixture.transitioned(BookingStatus::Cancelled);
        let client_id = fixture.booking.client_id;

        bookings
            .expect_transition_from_confirmed()
            .returning(move |_, _, _, _| {
                let cancelled = cancelled.clone();
                Box::pin(async move { Ok(Some(cancelled)) })
            });

        let mut notifier = MockNotificationSink::new();
        notifier
            .expect_notify()
            .withf(move |account_id, event| {
                *account_id == client_id
                    && matches!(event, NotificationEvent::BookingCancelled { .. })
            })
            .times(1)
            .return_const(());

        let usecase = usecase(sessions, MockProfileRepository::new(), bookings, notifier);

        let result = usecase
            .cancel(fixture.booking.id, fixture.session.trainer_id, None)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn stranger_cannot_cancel() {
        let fixture = Fixture::new(Utc::now() + Duration::days(2), BookingStatus::Confirmed);
        let (sessions, mut bookings) = fixture.repos();
        bookings.expect_transition_from_confirmed().never();

        let usecase = usecase(sessions, MockProfileRepository::new(), bookings, silent_notifier());

        let err = usecase
            .cancel(fixture.booking.id, Uuid::new_v4(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::Forbidden));
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn terminal_states_are_irreversible() {
        for status in [
            BookingStatus::Cancelled,
            BookingStatus::Attended,
            BookingStatus::NoShow,
        ] {
            let fixture = Fixture::new(Utc::now() - Duration::hours(1), status);
            let (sessions, mut bookings) = fixture.repos();
            bookings.expect_transition_from_confirmed().never();

            let usecase = usecase(
                sessions,
                MockProfileRepository::new(),
                bookings,
                silent_notifier(),
            );

            let cancel = usecase
                .cancel(fixture.booking.id, fixture.booking.client_id, None)
                .await;
            let attend = usecase
                .mark_attended(fixture.booking.id, fixture.session.trainer_id)
                .await;
            let no_show = usecase
                .mark_no_show(fixture.booking.id, fixture.session.trainer_id)
                .await;

            assert!(matches!(cancel, Err(LifecycleError::InvalidState(_))));
            assert!(matches!(attend, Err(LifecycleError::InvalidState(_))));
            assert!(matches!(no_show, Err(LifecycleError::InvalidState(_))));
        }
    }

    #[tokio::test]
    async fn lost_race_reports_invalid_state() {
        let fixture = Fixture::new(Utc::now() + Duration::days(1), BookingStatus::Confirmed);
        let (sessions, mut bookings) = fixture.repos();
        bookings
            .expect_transition_from_confirmed()
            .returning(|_, _, _, _| Box::pin(async { Ok(None) }));

        let usecase = usecase(sessions, MockProfileRepository::new(), bookings, silent_notifier());

        let err = usecase
            .cancel(fixture.booking.id, fixture.booking.client_id, None)
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::InvalidState(_)));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn attendance_requires_started_session() {
        let fixture = Fixture::new(Utc::now() + Duration::hours(3), BookingStatus::Confirmed);
        let (sessions, mut bookings) = fixture.repos();
        bookings.expect_transition_from_confirmed().never();

        let usecase = usecase(sessions, MockProfileRepository::new(), bookings, silent_notifier());

        let err = usecase
            .mark_attended(fixture.booking.id, fixture.session.trainer_id)
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::SessionNotStarted));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn only_trainer_marks_no_show() {
        let fixture = Fixture::new(Utc::now() - Duration::minutes(10), BookingStatus::Confirmed);
        let (sessions, mut bookings) = fixture.repos();
        bookings.expect_transition_from_confirmed().never();

        let usecase = usecase(sessions, MockProfileRepository::new(), bookings, silent_notifier());

        let err = usecase
            .mark_no_show(fixture.booking.id, fixture.booking.client_id)
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::Forbidden));
    }

    #[tokio::test]
    async fn trainer_marks_attended_after_start() {
        let fixture = Fixture::new(Utc::now() - Duration::minutes(10), BookingStatus::Confirmed);
        let (sessions, mut bookings) = fixture.repos();
        let attended = fixture.transitioned(BookingStatus::Attended);

        bookings
            .expect_transition_from_confirmed()
            .with(eq(fixture.booking.id), eq(BookingStatus::Attended), eq(None::<String>), always())
            .times(1)
            .returning(move |_, _, _, _| {
                let attended = attended.clone();
                Box::pin(async move { Ok(Some(attended)) })
            });

        let usecase = usecase(sessions, MockProfileRepository::new(), bookings, silent_notifier());

        let dto = usecase
            .mark_attended(fixture.booking.id, fixture.session.trainer_id)
            .await
            .unwrap();

        assert_eq!(dto.status, BookingStatus::Attended);
        assert!(dto.cancelled_at.is_none());
    }

    #[tokio::test]
    async fn roster_is_visible_to_admin_only_besides_trainer() {
        let fixture = Fixture::new(Utc::now() + Duration::days(1), BookingStatus::Confirmed);
        let (sessions, mut bookings) = fixture.repos();
        let roster = vec![fixture.booking.clone()];
        bookings.expect_list_for_session().returning(move |_| {
            let roster = roster.clone();
            Box::pin(async move { Ok(roster) })
        });

        let admin_id = Uuid::new_v4();
        let mut profiles = MockProfileRepository::new();
        profiles.expect_find_by_id().returning(move |id| {
            let now = Utc::now();
            let profile = ProfileEntity {
                id,
                email: "someone@example.com".to_string(),
                display_name: None,
                is_trainer: false,
                is_admin: id == admin_id,
                is_guest: false,
                is_member: false,
                has_full_access: false,
                membership_status: "none".to_string(),
                membership_tier_id: None,
                billing_customer_id: None,
                billing_subscription_id: None,
                created_at: now,
                updated_at: now,
            };
            Box::pin(async move { Ok(Some(profile)) })
        });

        let usecase = usecase(sessions, profiles, bookings, silent_notifier());

        let as_admin = usecase
            .list_for_session(fixture.session.id, admin_id)
            .await
            .unwrap();
        let as_client = usecase
            .list_for_session(fixture.session.id, fixture.booking.client_id)
            .await;

        assert_eq!(as_admin.len(), 1);
        assert!(matches!(as_client, Err(LifecycleError::Forbidden)));
    }
}
