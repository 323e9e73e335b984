pub mod bookings;
pub mod membership_tiers;
pub mod profiles;
pub mod push_endpoints;
pub mod sessions;
