use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::bookings::BookingEntity,
    value_objects::{enums::booking_statuses::BookingStatus, error_kinds::ErrorKind},
};

/// What the storage layer reports back from the locked check-and-insert.
#[derive(Debug, Clone)]
pub enum ReservationAttempt {
    Booked(BookingEntity),
    AlreadyBooked,
    SessionFull,
    /// The session row vanished between validation and the lock.
    SessionMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    SessionFull,
    AlreadyBooked,
    ReservationFailed,
}

impl RejectionReason {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RejectionReason::SessionFull | RejectionReason::AlreadyBooked => ErrorKind::Conflict,
            RejectionReason::ReservationFailed => ErrorKind::StorageFailure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReservationOutcome {
    Confirmed { booking_id: Uuid },
    Rejected { reason: RejectionReason },
}

impl ReservationOutcome {
    pub fn rejected(reason: RejectionReason) -> Self {
        ReservationOutcome::Rejected { reason }
    }
}

/// Target of a lifecycle transition out of `confirmed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingTransition {
    Cancel { reason: Option<String> },
    Attend,
    NoShow,
}

impl BookingTransition {
    pub fn target_status(&self) -> BookingStatus {
        match self {
            BookingTransition::Cancel { .. } => BookingStatus::Cancelled,
            BookingTransition::Attend => BookingStatus::Attended,
            BookingTransition::NoShow => BookingStatus::NoShow,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReserveBookingModel {
    pub session_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuestReserveBookingModel {
    pub session_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelBookingModel {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingDto {
    pub id: Uuid,
    pub session_id: Uuid,
    pub client_id: Uuid,
    pub status: BookingStatus,
    pub booked_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

impl From<BookingEntity> for BookingDto {
    fn from(value: BookingEntity) -> Self {
        let status = value.status().unwrap_or(BookingStatus::Cancelled);
        Self {
            id: value.id,
            session_id: value.session_id,
            client_id: value.client_id,
            status,
            booked_at: value.booked_at,
            cancelled_at: value.cancelled_at,
            cancellation_reason: value.cancellation_reason,
        }
    }
}
