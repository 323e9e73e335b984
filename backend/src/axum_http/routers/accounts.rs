use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use crates::infra::db::{
    postgres::postgres_connection::PgPoolSquad,
    repositories::{bookings::BookingPostgres, profiles::ProfilePostgres},
};

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    usecases::guest_merge::GuestMergeUseCase,
};

use super::guest_bookings::GuestMerge;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let guest_merge_usecase = GuestMergeUseCase::new(
        Arc::new(ProfilePostgres::new(Arc::clone(&db_pool))),
        Arc::new(BookingPostgres::new(Arc::clone(&db_pool))),
    );

    Router::new()
        .route("/merge-guest", post(merge_guest))
        .with_state(Arc::new(guest_merge_usecase))
}

/// Called by the client right after sign-in; the email comes from the verified token.
pub async fn merge_guest(
    State(guest_merge_usecase): State<Arc<GuestMerge>>,
    auth: AuthUser,
) -> axum::response::Response {
    let Some(email) = auth.email.as_deref() else {
        return AppError::BadRequest("token carries no email".to_string()).into_response();
    };

    match guest_merge_usecase.merge(auth.user_id, email).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) => err.into_response(),
    }
}
