pub mod access_gate;
pub mod booking_lifecycle;
pub mod guest_merge;
pub mod memberships;
pub mod notifications;
pub mod reservations;
