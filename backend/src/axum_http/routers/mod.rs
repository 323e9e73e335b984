pub mod access;
pub mod accounts;
pub mod bookings;
pub mod guest_bookings;
pub mod memberships;
pub mod push_endpoints;

use std::sync::Arc;

use crates::infra::{
    db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            bookings::BookingPostgres, profiles::ProfilePostgres,
            push_endpoints::PushEndpointPostgres, sessions::SessionPostgres,
        },
    },
    push::web_push_client::WebPushClient,
};

use crate::usecases::{
    notifications::{DetachedDispatcher, NotificationDispatcher},
    reservations::ReservationUseCase,
};

pub type PushDispatcher = NotificationDispatcher<PushEndpointPostgres, WebPushClient>;
pub type PushNotifier = DetachedDispatcher<PushEndpointPostgres, WebPushClient>;
pub type Reservations =
    ReservationUseCase<SessionPostgres, ProfilePostgres, BookingPostgres, PushNotifier>;

pub fn reservations(db_pool: &Arc<PgPoolSquad>, notifier: &Arc<PushNotifier>) -> Reservations {
    ReservationUseCase::new(
        Arc::new(SessionPostgres::new(Arc::clone(db_pool))),
        Arc::new(ProfilePostgres::new(Arc::clone(db_pool))),
        Arc::new(BookingPostgres::new(Arc::clone(db_pool))),
        Arc::clone(notifier),
    )
}
