use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::sessions::SessionEntity;

#[async_trait]
#[automock]
pub trait SessionRepository {
    async fn find_by_id(&self, session_id: Uuid) -> Result<Option<SessionEntity>>;
}
