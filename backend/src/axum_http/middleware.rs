use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use crates::{
    domain::value_objects::{access::AccessDecision, error_kinds::ErrorKind},
    infra::db::repositories::profiles::ProfilePostgres,
};
use tracing::info;

use crate::{
    auth::AuthUser, axum_http::error_responses::error_response,
    usecases::access_gate::AccessGateUseCase,
};

pub type AccessGate = AccessGateUseCase<ProfilePostgres>;

/// Paywall guard for member-only routes. Unauthenticated requests pass through to the
/// handler's own `AuthUser` check.
pub async fn require_access(
    State(access_gate): State<Arc<AccessGate>>,
    auth: Option<AuthUser>,
    request: Request,
    next: Next,
) -> Response {
    // Nested routers see a stripped uri; gate on the path the client asked for.
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().path(), |original| original.path())
        .to_string();
    let user_id = auth.map(|auth| auth.user_id);

    match access_gate.evaluate(user_id, &path).await {
        Ok(AccessDecision::Allow) => next.run(request).await,
        Ok(AccessDecision::RedirectToPaywall { target }) => {
            info!(
                user_id = ?user_id,
                path = %path,
                target,
                "access_gate: redirecting to paywall"
            );
            Redirect::to(target).into_response()
        }
        Err(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::StorageFailure,
            String::new(),
        ),
    }
}
