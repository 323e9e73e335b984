use std::sync::Arc;

use anyhow::Result;
use crates::domain::{
    repositories::profiles::ProfileRepository,
    value_objects::{
        access::{AccessDecision, AccessProfile, EXEMPT_PATH_PREFIXES},
        enums::membership_statuses::MembershipStatus,
    },
};
use tracing::{debug, error};
use uuid::Uuid;

/// Decides whether a request for `path` may proceed. Pure: same input, same answer.
pub fn decide(profile: Option<&AccessProfile>, path: &str) -> AccessDecision {
    if is_exempt(path) {
        return AccessDecision::Allow;
    }

    let Some(profile) = profile else {
        // Unauthenticated requests are the auth layer's problem, not the paywall's.
        return AccessDecision::Allow;
    };

    if profile.is_trainer || profile.is_admin || profile.has_full_access {
        return AccessDecision::Allow;
    }

    if profile.is_member && profile.membership_status == MembershipStatus::Active {
        return AccessDecision::Allow;
    }

    AccessDecision::paywall()
}

/// Whole-segment prefix match: `/member/plans/annual` is exempt, `/member/plansx` is not.
pub fn is_exempt(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or(path);

    EXEMPT_PATH_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

pub struct AccessGateUseCase<P>
where
    P: ProfileRepository + Send + Sync + 'static,
{
    profile_repository: Arc<P>,
}

impl<P> AccessGateUseCase<P>
where
    P: ProfileRepository + Send + Sync + 'static,
{
    pub fn new(profile_repository: Arc<P>) -> Self {
        Self { profile_repository }
    }

    pub async fn evaluate(&self, user_id: Option<Uuid>, path: &str) -> Result<AccessDecision> {
        if is_exempt(path) {
            return Ok(AccessDecision::Allow);
        }

        let profile = match user_id {
            Some(user_id) => self
                .profile_repository
                .find_by_id(user_id)
                .await
                .map_err(|err| {
                    error!(%user_id, db_error = ?err, "access_gate: failed to load profile");
                    err
                })?
                .map(|profile| profile.access_profile()),
            None => None,
        };

        let decision = decide(profile.as_ref(), path);
        debug!(user_id = ?user_id, path, ?decision, "access_gate: decided");

        Ok(decision)
    }
}
