use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    repositories::{
        bookings::BookingRepository, profiles::ProfileRepository, sessions::SessionRepository,
    },
    value_objects::{
        bookings::{RejectionReason, ReservationAttempt, ReservationOutcome},
        error_kinds::ErrorKind,
        notifications::NotificationEvent,
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::notifications::NotificationSink;

/// Precondition failures. Nothing has been written when one of these is returned.
#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("session not found")]
    SessionNotFound,
    #[error("session has already started")]
    SessionStarted,
    #[error("client profile not found")]
    ClientNotFound,
}

impl ReservationError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ReservationError::SessionNotFound | ReservationError::ClientNotFound => {
                StatusCode::NOT_FOUND
            }
            ReservationError::SessionStarted => StatusCode::BAD_REQUEST,
        }
    }
}

pub struct ReservationUseCase<S, P, B, N>
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

impl<S, P, B, N> ReservationUseCase<S, P, B, N>
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

    /// Converts "client wants a seat in session" into a booking or a rejection.
    /// Storage trouble anywhere yields `RESERVATION_FAILED`, which is safe to retry.
    pub async fn reserve(
        &self,
        session_id: Uuid,
        client_id: Uuid,
    ) -> Result<ReservationOutcome, ReservationError> {
        info!(%session_id, %client_id, "reservations: reserve requested");
        let now = Utc::now();

        let session = match self.session_repository.find_by_id(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                warn!(%session_id, "reservations: session not found");
                return Err(ReservationError::SessionNotFound);
            }
            Err(err) => return Ok(self.storage_failure(session_id, client_id, err)),
        };

        if session.has_started(now) {
            warn!(
                %session_id,
                starts_at = %session.starts_at,
                "reservations: session already started"
            );
            return Err(ReservationError::SessionStarted);
        }

        match self.profile_repository.find_by_id(client_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!(%client_id, "reservations: client profile not found");
                return Err(ReservationError::ClientNotFound);
            }
            Err(err) => return Ok(self.storage_failure(session_id, client_id, err)),
        }

        let attempt = match self
            .booking_repository
            .reserve_seat(session_id, client_id, now)
            .await
        {
            Ok(attempt) => attempt,
            Err(err) => return Ok(self.storage_failure(session_id, client_id, err)),
        };

        let outcome = match attempt {
            ReservationAttempt::Booked(booking) => {
                info!(
                    %session_id,
                    %client_id,
                    booking_id = %booking.id,
                    "reservations: booking confirmed"
                );

                self.notifier.notify(
                    client_id,
                    NotificationEvent::BookingConfirmed {
                        booking_id: booking.id,
                        session_id,
                        starts_at: session.starts_at,
                    },
                );

                ReservationOutcome::Confirmed {
                    booking_id: booking.id,
                }
            }
            ReservationAttempt::AlreadyBooked => {
                info!(%session_id, %client_id, "reservations: client already booked");
                ReservationOutcome::rejected(RejectionReason::AlreadyBooked)
            }
            ReservationAttempt::SessionFull => {
                info!(
                    %session_id,
                    %client_id,
                    capacity = session.capacity,
                    "reservations: session full"
                );
                ReservationOutcome::rejected(RejectionReason::SessionFull)
            }
            ReservationAttempt::SessionMissing => {
                warn!(%session_id, "reservations: session vanished before lock");
                return Err(ReservationError::SessionNotFound);
            }
        };

        Ok(outcome)
    }

    fn storage_failure(
        &self,
        session_id: Uuid,
        client_id: Uuid,
        err: anyhow::Error,
    ) -> ReservationOutcome {
        error!(
            %session_id,
            %client_id,
            db_error = ?err,
            kind = %ErrorKind::StorageFailure,
            "reservations: storage failure"
        );
        ReservationOutcome::rejected(RejectionReason::ReservationFailed)
    }
}
