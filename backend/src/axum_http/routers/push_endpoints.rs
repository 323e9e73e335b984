use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use crates::domain::value_objects::notifications::{
    RegisterPushEndpointModel, RemovePushEndpointModel,
};

use crate::{
    auth::AuthUser, axum_http::routers::PushDispatcher, usecases::notifications::NotificationError,
};

pub fn routes(dispatcher: Arc<PushDispatcher>) -> Router {
    Router::new()
        .route("/", post(register).delete(remove))
        .with_state(dispatcher)
}

pub async fn register(
    State(dispatcher): State<Arc<PushDispatcher>>,
    auth: AuthUser,
    Json(model): Json<RegisterPushEndpointModel>,
) -> Result<impl IntoResponse, NotificationError> {
    dispatcher.register_endpoint(auth.user_id, model).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    State(dispatcher): State<Arc<PushDispatcher>>,
    auth: AuthUser,
    Json(model): Json<RemovePushEndpointModel>,
) -> Result<impl IntoResponse, NotificationError> {
    let removed = dispatcher.remove_endpoint(auth.user_id, model.endpoint).await?;
    Ok(if removed {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    })
}
