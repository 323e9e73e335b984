use serde::Serialize;

/// Result of moving a guest's bookings onto an authenticated profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingTransfer {
    pub moved: u64,
    /// Guest bookings cancelled because the account already held that session.
    pub duplicates_cancelled: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub merged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookings_moved: Option<u64>,
}

impl MergeOutcome {
    pub fn not_merged() -> Self {
        Self {
            merged: false,
            bookings_moved: None,
        }
    }

    pub fn merged(bookings_moved: u64) -> Self {
        Self {
            merged: true,
            bookings_moved: Some(bookings_moved),
        }
    }
}

/// Reason stamped on guest bookings that collided with the account's own booking.
pub const MERGED_DUPLICATE_REASON: &str = "merged_duplicate";
