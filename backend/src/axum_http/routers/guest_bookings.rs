use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
};
use crates::{
    domain::value_objects::bookings::GuestReserveBookingModel,
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{bookings::BookingPostgres, profiles::ProfilePostgres},
    },
};

use crate::{
    axum_http::routers::{PushNotifier, Reservations, bookings::outcome_response, reservations},
    usecases::guest_merge::GuestMergeUseCase,
};

pub type GuestMerge = GuestMergeUseCase<ProfilePostgres, BookingPostgres>;

#[derive(Clone)]
pub struct GuestBookingsState {
    pub guests: Arc<GuestMerge>,
    pub reservations: Arc<Reservations>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, notifier: Arc<PushNotifier>) -> Router {
    let guests = GuestMergeUseCase::new(
        Arc::new(ProfilePostgres::new(Arc::clone(&db_pool))),
        Arc::new(BookingPostgres::new(Arc::clone(&db_pool))),
    );

    Router::new()
        .route("/", post(reserve_as_guest))
        .with_state(GuestBookingsState {
            guests: Arc::new(guests),
            reservations: Arc::new(reservations(&db_pool, &notifier)),
        })
}

/// Unauthenticated booking: the email resolves to a guest profile that is merged at signup.
pub async fn reserve_as_guest(
    State(state): State<GuestBookingsState>,
    Json(model): Json<GuestReserveBookingModel>,
) -> Response {
    let guest = match state
        .guests
        .ensure_guest(&model.email, model.display_name)
        .await
    {
        Ok(guest) => guest,
        Err(err) => return err.into_response(),
    };

    match state.reservations.reserve(model.session_id, guest.id).await {
        Ok(outcome) => outcome_response(outcome),
        Err(err) => err.into_response(),
    }
}
