use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::push_endpoints::{InsertPushEndpointEntity, PushEndpointEntity};

#[async_trait]
#[automock]
pub trait PushEndpointRepository {
    async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<PushEndpointEntity>>;

    /// Re-registering the same endpoint refreshes its keys.
    async fn upsert(&self, insert_endpoint: InsertPushEndpointEntity) -> Result<()>;

    async fn delete_for_account(&self, account_id: Uuid, endpoints: Vec<String>) -> Result<usize>;
}
