use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use crates::infra::db::{
    postgres::postgres_connection::PgPoolSquad, repositories::profiles::ProfilePostgres,
};
use serde::Deserialize;

use crate::{
    auth::AuthUser,
    axum_http::{error_responses::AppError, middleware::AccessGate},
    usecases::access_gate::AccessGateUseCase,
};

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub path: String,
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let access_gate = AccessGateUseCase::new(Arc::new(ProfilePostgres::new(db_pool)));

    Router::new()
        .route("/", get(check_access))
        .with_state(Arc::new(access_gate))
}

/// Lets the client router ask the same question the middleware answers.
pub async fn check_access(
    State(access_gate): State<Arc<AccessGate>>,
    auth: Option<AuthUser>,
    Query(query): Query<AccessQuery>,
) -> Result<impl IntoResponse, AppError> {
    if !query.path.starts_with('/') {
        return Err(AppError::BadRequest("path must be absolute".to_string()));
    }

    let decision = access_gate
        .evaluate(auth.map(|auth| auth.user_id), &query.path)
        .await?;

    Ok(Json(decision))
}
