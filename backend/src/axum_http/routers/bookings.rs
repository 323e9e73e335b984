use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crates::{
    domain::value_objects::bookings::{
        CancelBookingModel, ReservationOutcome, ReserveBookingModel,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            bookings::BookingPostgres, profiles::ProfilePostgres, sessions::SessionPostgres,
        },
    },
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::{
        middleware::{AccessGate, require_access},
        routers::{PushNotifier, Reservations, reservations},
    },
    usecases::{
        access_gate::AccessGateUseCase,
        booking_lifecycle::{BookingLifecycleUseCase, LifecycleError},
        reservations::ReservationError,
    },
};

pub type Lifecycle =
    BookingLifecycleUseCase<SessionPostgres, ProfilePostgres, BookingPostgres, PushNotifier>;

#[derive(Clone)]
pub struct BookingsState {
    pub reservations: Arc<Reservations>,
    pub lifecycle: Arc<Lifecycle>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, notifier: Arc<PushNotifier>) -> Router {
    let state = state(&db_pool, &notifier);
    let access_gate: Arc<AccessGate> = Arc::new(AccessGateUseCase::new(Arc::new(
        ProfilePostgres::new(Arc::clone(&db_pool)),
    )));

    // Lapsed members can still cancel; booking and browsing need access.
    let gated = Router::new()
        .route("/", post(reserve).get(list_mine))
        .route_layer(middleware::from_fn_with_state(access_gate, require_access));

    Router::new()
        .merge(gated)
        .route("/:booking_id/cancel", post(cancel))
        .route("/:booking_id/attended", post(mark_attended))
        .route("/:booking_id/no-show", post(mark_no_show))
        .with_state(state)
}

/// Trainer/admin roster, mounted under `/api/v1/sessions`.
pub fn session_routes(db_pool: Arc<PgPoolSquad>, notifier: Arc<PushNotifier>) -> Router {
    Router::new()
        .route("/:session_id/bookings", get(list_for_session))
        .with_state(state(&db_pool, &notifier))
}

fn state(db_pool: &Arc<PgPoolSquad>, notifier: &Arc<PushNotifier>) -> BookingsState {
    let lifecycle = BookingLifecycleUseCase::new(
        Arc::new(SessionPostgres::new(Arc::clone(db_pool))),
        Arc::new(ProfilePostgres::new(Arc::clone(db_pool))),
        Arc::new(BookingPostgres::new(Arc::clone(db_pool))),
        Arc::clone(notifier),
    );

    BookingsState {
        reservations: Arc::new(reservations(db_pool, notifier)),
        lifecycle: Arc::new(lifecycle),
    }
}

pub fn outcome_response(outcome: ReservationOutcome) -> Response {
    let status = match outcome {
        ReservationOutcome::Confirmed { .. } => StatusCode::CREATED,
        ReservationOutcome::Rejected { .. } => StatusCode::OK,
    };
    (status, Json(outcome)).into_response()
}

pub async fn reserve(
    State(state): State<BookingsState>,
    auth: AuthUser,
    Json(model): Json<ReserveBookingModel>,
) -> Result<Response, ReservationError> {
    let outcome = state
        .reservations
        .reserve(model.session_id, auth.user_id)
        .await?;
    Ok(outcome_response(outcome))
}

pub async fn list_mine(
    State(state): State<BookingsState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, LifecycleError> {
    let bookings = state.lifecycle.list_for_client(auth.user_id).await?;
    Ok(Json(bookings))
}

pub async fn cancel(
    State(state): State<BookingsState>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
    model: Option<Json<CancelBookingModel>>,
) -> Result<impl IntoResponse, LifecycleError> {
    let reason = model.and_then(|Json(model)| model.reason);
    let booking = state
        .lifecycle
        .cancel(booking_id, auth.user_id, reason)
        .await?;
    Ok(Json(booking))
}

pub async fn mark_attended(
    State(state): State<BookingsState>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, LifecycleError> {
    let booking = state
        .lifecycle
        .mark_attended(booking_id, auth.user_id)
        .await?;
    Ok(Json(booking))
}

pub async fn mark_no_show(
    State(state): State<BookingsState>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, LifecycleError> {
    let booking = state
        .lifecycle
        .mark_no_show(booking_id, auth.user_id)
        .await?;
    Ok(Json(booking))
}

pub async fn list_for_session(
    State(state): State<BookingsState>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, LifecycleError> {
    let bookings = state
        .lifecycle
        .list_for_session(session_id, auth.user_id)
        .await?;
    Ok(Json(bookings))
}
