use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{entities::sessions::SessionEntity, repositories::sessions::SessionRepository},
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::sessions},
};

pub struct SessionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SessionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SessionRepository for SessionPostgres {
    async fn find_by_id(&self, session_id: Uuid) -> Result<Option<SessionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = sessions::table
            .find(session_id)
            .select(SessionEntity::as_select())
            .first::<SessionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }
}
