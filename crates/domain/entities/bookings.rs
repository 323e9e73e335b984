use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::booking_statuses::BookingStatus,
    infra::db::postgres::schema::bookings,
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = bookings)]
pub struct BookingEntity {
    pub id: Uuid,
    pub session_id: Uuid,
    pub client_id: Uuid,
    pub status: String,
    pub booked_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl BookingEntity {
    /// `None` only for rows written outside the CHECK constraint.
    pub fn status(&self) -> Option<BookingStatus> {
        BookingStatus::from_str(&self.status)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct InsertBookingEntity {
    pub session_id: Uuid,
    pub client_id: Uuid,
    pub status: String,
    pub booked_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
