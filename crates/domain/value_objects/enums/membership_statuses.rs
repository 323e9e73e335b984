use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    #[default]
    None,
    Active,
    PastDue,
    Canceled,
}

impl Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            MembershipStatus::None => "none",
            MembershipStatus::Active => "active",
            MembershipStatus::PastDue => "past_due",
            MembershipStatus::Canceled => "canceled",
        };
        write!(f, "{}", status)
    }
}

impl MembershipStatus {
    pub fn from_str(value: &str) -> Self {
        match value {
            "active" => MembershipStatus::Active,
            "past_due" => MembershipStatus::PastDue,
            "canceled" => MembershipStatus::Canceled,
            _ => MembershipStatus::None,
        }
    }
}
