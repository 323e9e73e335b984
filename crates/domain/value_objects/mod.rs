pub mod access;
pub mod bookings;
pub mod emails;
pub mod enums;
pub mod error_kinds;
pub mod guest_merge;
pub mod memberships;
pub mod notifications;
