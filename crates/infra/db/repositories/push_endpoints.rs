use anyhow::Result;
use async_trait::async_trait;
use diesel::{delete, insert_into, prelude::*, upsert::excluded};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::push_endpoints::{InsertPushEndpointEntity, PushEndpointEntity},
        repositories::push_endpoints::PushEndpointRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::push_endpoints},
};

pub struct PushEndpointPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PushEndpointPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PushEndpointRepository for PushEndpointPostgres {
    async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<PushEndpointEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = push_endpoints::table
            .filter(push_endpoints::account_id.eq(account_id))
            .select(PushEndpointEntity::as_select())
            .load::<PushEndpointEntity>(&mut conn)?;

        Ok(results)
    }

    async fn upsert(&self, insert_endpoint: InsertPushEndpointEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(push_endpoints::table)
            .values(&insert_endpoint)
            .on_conflict((push_endpoints::account_id, push_endpoints::endpoint))
            .do_update()
            .set((
                push_endpoints::p256dh.eq(excluded(push_endpoints::p256dh)),
                push_endpoints::auth.eq(excluded(push_endpoints::auth)),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn delete_for_account(&self, account_id: Uuid, endpoints: Vec<String>) -> Result<usize> {
        if endpoints.is_empty() {
            return Ok(0);
        }

        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = delete(
            push_endpoints::table
                .filter(push_endpoints::account_id.eq(account_id))
                .filter(push_endpoints::endpoint.eq_any(endpoints)),
        )
        .execute(&mut conn)?;

        Ok(deleted)
    }
}
