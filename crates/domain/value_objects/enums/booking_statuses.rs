use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Confirmed,
    Cancelled,
    Attended,
    NoShow,
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Attended => "attended",
            BookingStatus::NoShow => "no_show",
        };
        write!(f, "{}", status)
    }
}

impl BookingStatus {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "attended" => Some(BookingStatus::Attended),
            "no_show" => Some(BookingStatus::NoShow),
            _ => None,
        }
    }

    /// Cancelled, attended and no-show bookings never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Confirmed)
    }
}
