pub mod booking_statuses;
pub mod membership_statuses;
