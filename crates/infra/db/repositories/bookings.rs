use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{
    insert_into,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
    update,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{bookings, sessions},
    },
};
use domain::{
    entities::bookings::{BookingEntity, InsertBookingEntity},
    repositories::bookings::BookingRepository,
    value_objects::{
        bookings::ReservationAttempt,
        enums::booking_statuses::BookingStatus,
        guest_merge::{BookingTransfer, MERGED_DUPLICATE_REASON},
    },
};

pub struct BookingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BookingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BookingRepository for BookingPostgres {
    async fn reserve_seat(
        &self,
        session_id: Uuid,
        client_id: Uuid,
        booked_at: DateTime<Utc>,
    ) -> Result<ReservationAttempt> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let confirmed = BookingStatus::Confirmed.to_string();

        let result = conn.transaction::<ReservationAttempt, DieselError, _>(|tx| {
            // Serializes every reservation against this session until commit.
            let capacity = sessions::table
                .find(session_id)
                .select(sessions::capacity)
                .for_update()
                .first::<i32>(tx)
                .optional()?;

            let Some(capacity) = capacity else {
                return Ok(ReservationAttempt::SessionMissing);
            };

            let existing = bookings::table
                .filter(bookings::session_id.eq(session_id))
                .filter(bookings::client_id.eq(client_id))
                .filter(bookings::status.eq(&confirmed))
                .select(bookings::id)
                .first::<Uuid>(tx)
                .optional()?;

            if existing.is_some() {
                return Ok(ReservationAttempt::AlreadyBooked);
            }

            let confirmed_count = bookings::table
                .filter(bookings::session_id.eq(session_id))
                .filter(bookings::status.eq(&confirmed))
                .count()
                .get_result::<i64>(tx)?;

            if confirmed_count >= i64::from(capacity) {
                return Ok(ReservationAttempt::SessionFull);
            }

            let booking = insert_into(bookings::table)
                .values(&InsertBookingEntity {
                    session_id,
                    client_id,
                    status: confirmed.clone(),
                    booked_at,
                    updated_at: booked_at,
                })
                .returning(BookingEntity::as_select())
                .get_result::<BookingEntity>(tx)?;

            Ok(ReservationAttempt::Booked(booking))
        });

        match result {
            Ok(attempt) => Ok(attempt),
            // Partial unique index caught a duplicate that slipped past the check.
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Ok(ReservationAttempt::AlreadyBooked)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = bookings::table
            .find(booking_id)
            .select(BookingEntity::as_select())
            .first::<BookingEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn transition_from_confirmed(
        &self,
        booking_id: Uuid,
        target: BookingStatus,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Option<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let cancelled_at = (target == BookingStatus::Cancelled).then_some(at);
        let reason = if target == BookingStatus::Cancelled {
            reason
        } else {
            None
        };

        let result = update(bookings::table)
            .filter(bookings::id.eq(booking_id))
            .filter(bookings::status.eq(BookingStatus::Confirmed.to_string()))
            .set((
                bookings::status.eq(target.to_string()),
                bookings::cancelled_at.eq(cancelled_at),
                bookings::cancellation_reason.eq(reason),
                bookings::updated_at.eq(at),
            ))
            .returning(BookingEntity::as_select())
            .get_result::<BookingEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_for_client(&self, client_id: Uuid) -> Result<Vec<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = bookings::table
            .filter(bookings::client_id.eq(client_id))
            .order(bookings::booked_at.desc())
            .select(BookingEntity::as_select())
            .load::<BookingEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_for_session(&self, session_id: Uuid) -> Result<Vec<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = bookings::table
            .filter(bookings::session_id.eq(session_id))
            .order(bookings::booked_at.asc())
            .select(BookingEntity::as_select())
            .load::<BookingEntity>(&mut conn)?;

        Ok(results)
    }

    async fn count_confirmed(&self, session_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = bookings::table
            .filter(bookings::session_id.eq(session_id))
            .filter(bookings::status.eq(BookingStatus::Confirmed.to_string()))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn reassign_client(
        &self,
        from_client_id: Uuid,
        to_client_id: Uuid,
    ) -> Result<BookingTransfer> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let confirmed = BookingStatus::Confirmed.to_string();
        let now = Utc::now();

        let transfer = conn.transaction::<BookingTransfer, DieselError, _>(|tx| {
            let held_sessions = bookings::table
                .filter(bookings::client_id.eq(to_client_id))
                .filter(bookings::status.eq(&confirmed))
                .select(bookings::session_id)
                .load::<Uuid>(tx)?;

            // A second confirmed row for the same session would break the
            // one-confirmed-per-client index once reassigned.
            let duplicates_cancelled = if held_sessions.is_empty() {
                0
            } else {
                update(bookings::table)
                    .filter(bookings::client_id.eq(from_client_id))
                    .filter(bookings::status.eq(&confirmed))
                    .filter(bookings::session_id.eq_any(held_sessions))
                    .set((
                        bookings::status.eq(BookingStatus::Cancelled.to_string()),
                        bookings::cancelled_at.eq(Some(now)),
                        bookings::cancellation_reason.eq(Some(MERGED_DUPLICATE_REASON)),
                        bookings::updated_at.eq(now),
                    ))
                    .execute(tx)?
            };

            let moved = update(bookings::table)
                .filter(bookings::client_id.eq(from_client_id))
                .set((
                    bookings::client_id.eq(to_client_id),
                    bookings::updated_at.eq(now),
                ))
                .execute(tx)?;

            Ok(BookingTransfer {
                moved: moved as u64,
                duplicates_cancelled: duplicates_cancelled as u64,
            })
        })?;

        Ok(transfer)
    }
}
