use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
};
use crates::{
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{membership_tiers::MembershipTierPostgres, profiles::ProfilePostgres},
    },
    payments::stripe_client::StripeWebhooks,
};
use serde_json::json;

use crate::{
    auth::AuthUser,
    config::config_model::DotEnvyConfig,
    usecases::memberships::{ActivationPolicy, MembershipError, MembershipUseCase, WebhookOutcome},
};

pub type Memberships = MembershipUseCase<ProfilePostgres, MembershipTierPostgres, StripeWebhooks>;

pub fn routes(db_pool: Arc<PgPoolSquad>, config: &DotEnvyConfig) -> Router {
    let membership_usecase = MembershipUseCase::new(
        Arc::new(ProfilePostgres::new(Arc::clone(&db_pool))),
        Arc::new(MembershipTierPostgres::new(Arc::clone(&db_pool))),
        Arc::new(StripeWebhooks::new(config.stripe.webhook_secret.clone())),
        ActivationPolicy::new(
            config.membership.attempts,
            Duration::from_millis(config.membership.base_delay_ms),
        ),
    );

    Router::new()
        .route("/webhook", post(stripe_webhook))
        .route("/tiers", get(list_tiers))
        .route("/activation", get(await_activation))
        .with_state(Arc::new(membership_usecase))
}

pub async fn stripe_webhook(
    State(membership_usecase): State<Arc<Memberships>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, MembershipError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|value| value.to_str().ok())
        .ok_or(MembershipError::InvalidSignature)?;

    let outcome = membership_usecase
        .handle_stripe_webhook(&body, signature)
        .await?;

    Ok(Json(json!({
        "received": true,
        "applied": outcome == WebhookOutcome::Applied,
    })))
}

pub async fn list_tiers(
    State(membership_usecase): State<Arc<Memberships>>,
) -> Result<impl IntoResponse, MembershipError> {
    let tiers = membership_usecase.list_tiers().await?;
    Ok(Json(tiers))
}

/// Polled by the checkout success page until the webhook has landed.
pub async fn await_activation(
    State(membership_usecase): State<Arc<Memberships>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, MembershipError> {
    let status = membership_usecase.await_activation(auth.user_id).await?;
    Ok(Json(status))
}
