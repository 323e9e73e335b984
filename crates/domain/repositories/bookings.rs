use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::bookings::BookingEntity,
    value_objects::{
        bookings::ReservationAttempt, enums::booking_statuses::BookingStatus,
        guest_merge::BookingTransfer,
    },
};

#[async_trait]
#[automock]
pub trait BookingRepository {
    /// Locks the session row, then checks duplicate and capacity before inserting.
    /// The whole check-and-insert is one transaction.
    async fn reserve_seat(
        &self,
        session_id: Uuid,
        client_id: Uuid,
        booked_at: DateTime<Utc>,
    ) -> Result<ReservationAttempt>;

    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>>;

    /// Moves a booking out of `confirmed`. Returns `None` when the row was
    /// no longer confirmed at write time.
    async fn transition_from_confirmed(
        &self,
        booking_id: Uuid,
        target: BookingStatus,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Option<BookingEntity>>;

    async fn list_for_client(&self, client_id: Uuid) -> Result<Vec<BookingEntity>>;

    async fn list_for_session(&self, session_id: Uuid) -> Result<Vec<BookingEntity>>;

    async fn count_confirmed(&self, session_id: Uuid) -> Result<i64>;

    /// Reassigns every booking of `from_client_id` to `to_client_id` in one transaction.
    async fn reassign_client(
        &self,
        from_client_id: Uuid,
        to_client_id: Uuid,
    ) -> Result<BookingTransfer>;
}
