use serde::Serialize;

use crate::domain::value_objects::enums::membership_statuses::MembershipStatus;

/// Where non-paying accounts are sent.
pub const PAYWALL_PATH: &str = "/member/plans";

/// Paths that never hit the paywall: auth pages and the membership pages themselves.
pub const EXEMPT_PATH_PREFIXES: &[&str] = &[
    "/login",
    "/signup",
    "/auth",
    "/reset-password",
    "/member/plans",
    "/member/checkout",
    "/member/success",
];

/// The subset of a profile the access gate looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessProfile {
    pub is_trainer: bool,
    pub is_admin: bool,
    pub has_full_access: bool,
    pub is_member: bool,
    pub membership_status: MembershipStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    RedirectToPaywall { target: &'static str },
}

impl AccessDecision {
    pub fn paywall() -> Self {
        AccessDecision::RedirectToPaywall {
            target: PAYWALL_PATH,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}
