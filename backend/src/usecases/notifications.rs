use std::sync::Arc;

use async_trait::async_trait;
use crates::{
    domain::{
        entities::push_endpoints::InsertPushEndpointEntity,
        repositories::push_endpoints::PushEndpointRepository,
        value_objects::{
            error_kinds::ErrorKind,
            notifications::{
                DispatchSummary, NotificationEvent, PushDelivery, PushPayload,
                RegisterPushEndpointModel,
            },
        },
    },
    infra::push::web_push_client::{WebPushClient, validate_endpoint},
};
use futures_util::future::join_all;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait PushGateway: Send + Sync {
    async fn deliver(&self, endpoint: String, payload: PushPayload) -> PushDelivery;
}

#[async_trait]
impl PushGateway for WebPushClient {
    async fn deliver(&self, endpoint: String, payload: PushPayload) -> PushDelivery {
        WebPushClient::deliver(self, &endpoint, &payload).await
    }
}

/// Fire-and-forget hand-off used by the booking use cases after commit.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    fn notify(&self, account_id: Uuid, event: NotificationEvent);
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("invalid push endpoint: {0}")]
    InvalidEndpoint(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl NotificationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NotificationError::InvalidEndpoint(_) => ErrorKind::Validation,
            NotificationError::Internal(_) => ErrorKind::StorageFailure,
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            NotificationError::InvalidEndpoint(_) => StatusCode::BAD_REQUEST,
            NotificationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct NotificationDispatcher<E, G>
where
    E: PushEndpointRepository + Send + Sync + 'static,
    G: PushGateway + 'static,
{
    push_endpoint_repository: Arc<E>,
    push_gateway: Arc<G>,
}

impl<E, G> NotificationDispatcher<E, G>
where
    E: PushEndpointRepository + Send + Sync + 'static,
    G: PushGateway + 'static,
{
    pub fn new(push_endpoint_repository: Arc<E>, push_gateway: Arc<G>) -> Self {
        Self {
            push_endpoint_repository,
            push_gateway,
        }
    }

    /// Delivers `event` to every endpoint of the account. Never fails; problems are logged.
    pub async fn dispatch(&self, account_id: Uuid, event: NotificationEvent) -> DispatchSummary {
        let endpoints = match self
            .push_endpoint_repository
            .list_for_account(account_id)
            .await
        {
            Ok(endpoints) => endpoints,
            Err(err) => {
                warn!(
                    %account_id,
                    db_error = ?err,
                    kind = %ErrorKind::BestEffortFailure,
                    "notifications: failed to load push endpoints"
                );
                return DispatchSummary::default();
            }
        };

        if endpoints.is_empty() {
            debug!(%account_id, "notifications: no push endpoints, skipping");
            return DispatchSummary::default();
        }

        let payload = PushPayload::from(&event);

        let deliveries = join_all(endpoints.iter().map(|endpoint| {
            self.push_gateway
                .deliver(endpoint.endpoint.clone(), payload.clone())
        }))
        .await;

        let mut summary = DispatchSummary {
            attempted: endpoints.len(),
            ..Default::default()
        };
        let mut gone = Vec::new();

        for (endpoint, delivery) in endpoints.into_iter().zip(deliveries) {
            match delivery {
                PushDelivery::Delivered => summary.delivered += 1,
                PushDelivery::Gone => gone.push(endpoint.endpoint),
                PushDelivery::Failed(reason) => {
                    summary.failed += 1;
                    warn!(
                        %account_id,
                        reason,
                        kind = %ErrorKind::BestEffortFailure,
                        "notifications: push delivery failed"
                    );
                }
            }
        }

        if !gone.is_empty() {
            let marked = gone.len();
            match self
                .push_endpoint_repository
                .delete_for_account(account_id, gone)
                .await
            {
                Ok(deleted) => {
                    summary.pruned = deleted;
                    info!(%account_id, marked, deleted, "notifications: pruned gone endpoints");
                }
                Err(err) => {
                    warn!(
                        %account_id,
                        marked,
                        db_error = ?err,
                        kind = %ErrorKind::BestEffortFailure,
                        "notifications: failed to prune gone endpoints"
                    );
                }
            }
        }

        summary
    }

    pub async fn register_endpoint(
        &self,
        account_id: Uuid,
        model: RegisterPushEndpointModel,
    ) -> Result<(), NotificationError> {
        validate_endpoint(&model.endpoint)
            .map_err(|err| NotificationError::InvalidEndpoint(err.to_string()))?;

        if model.keys.p256dh.trim().is_empty() || model.keys.auth.trim().is_empty() {
            return Err(NotificationError::InvalidEndpoint(
                "missing subscription keys".to_string(),
            ));
        }

        self.push_endpoint_repository
            .upsert(InsertPushEndpointEntity {
                account_id,
                endpoint: model.endpoint,
                p256dh: model.keys.p256dh,
                auth: model.keys.auth,
            })
            .await
            .map_err(|err| {
                error!(%account_id, db_error = ?err, "notifications: failed to register endpoint");
                NotificationError::Internal(err)
            })?;

        info!(%account_id, "notifications: push endpoint registered");
        Ok(())
    }

    /// Returns whether an endpoint was actually removed.
    pub async fn remove_endpoint(
        &self,
        account_id: Uuid,
        endpoint: String,
    ) -> Result<bool, NotificationError> {
        if endpoint.trim().is_empty() {
            return Err(NotificationError::InvalidEndpoint(
                "endpoint is required".to_string(),
            ));
        }

        let deleted = self
            .push_endpoint_repository
            .delete_for_account(account_id, vec![endpoint])
            .await
            .map_err(|err| {
                error!(%account_id, db_error = ?err, "notifications: failed to remove endpoint");
                NotificationError::Internal(err)
            })?;

        Ok(deleted > 0)
    }
}

/// Runs each dispatch on its own tokio task so callers never wait on push delivery.
pub struct DetachedDispatcher<E, G>
where
    E: PushEndpointRepository + Send + Sync + 'static,
    G: PushGateway + 'static,
{
    dispatcher: Arc<NotificationDispatcher<E, G>>,
}

impl<E, G> DetachedDispatcher<E, G>
where
    E: PushEndpointRepository + Send + Sync + 'static,
    G: PushGateway + 'static,
{
    pub fn new(dispatcher: Arc<NotificationDispatcher<E, G>>) -> Self {
        Self { dispatcher }
    }
}

impl<E, G> NotificationSink for DetachedDispatcher<E, G>
where
    E: PushEndpointRepository + Send + Sync + 'static,
    G: PushGateway + 'static,
{
    fn notify(&self, account_id: Uuid, event: NotificationEvent) {
        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            let summary = dispatcher.dispatch(account_id, event).await;
            debug!(
                %account_id,
                attempted = summary.attempted,
                delivered = summary.delivered,
                pruned = summary.pruned,
                failed = summary.failed,
                "notifications: dispatch finished"
            );
        });
    }
}
