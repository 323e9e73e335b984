//! Shared helpers for the Postgres-backed tests.
//!
//! These tests need a disposable database: set `TEST_DATABASE_URL`. Without it every test
//! prints a notice and returns early.

use std::sync::{Arc, Once};

use chrono::{DateTime, Duration, Utc};
use crates::infra::db::postgres::{
    postgres_connection::{PgPoolSquad, establish_connection},
    schema::{profiles, sessions},
};
use diesel::{RunQueryDsl, connection::SimpleConnection, insert_into, prelude::*};
use uuid::Uuid;

const MIGRATION: &str = include_str!("../../../migrations/2025-06-01-000000_booking_core/up.sql");

static MIGRATED: Once = Once::new();

pub fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("TEST_DATABASE_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
}

#[macro_export]
macro_rules! require_database {
    () => {
        match crate::common::database_url() {
            Some(url) => url,
            None => {
                eprintln!("Skipping: TEST_DATABASE_URL not set");
                return;
            }
        }
    };
}

/// Pool against the test database with the schema applied.
pub fn test_pool(url: &str) -> Arc<PgPoolSquad> {
    let pool = establish_connection(url, 16).expect("test database must be reachable");
    MIGRATED.call_once(|| {
        let mut conn = pool.get().expect("connection from pool");
        conn.batch_execute(MIGRATION).expect("migration applies");
    });
    Arc::new(pool)
}

#[allow(dead_code)]
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4().simple())
}

#[allow(dead_code)]
pub fn insert_registered_profile(pool: &PgPoolSquad, email: &str) -> Uuid {
    let mut conn = pool.get().expect("connection from pool");
    insert_into(profiles::table)
        .values((profiles::email.eq(email), profiles::is_guest.eq(false)))
        .returning(profiles::id)
        .get_result::<Uuid>(&mut conn)
        .expect("insert registered profile")
}

#[allow(dead_code)]
pub fn insert_guest_profile(pool: &PgPoolSquad, email: &str) -> Uuid {
    let mut conn = pool.get().expect("connection from pool");
    insert_into(profiles::table)
        .values((profiles::email.eq(email), profiles::is_guest.eq(true)))
        .returning(profiles::id)
        .get_result::<Uuid>(&mut conn)
        .expect("insert guest profile")
}

#[allow(dead_code)]
pub fn insert_trainer(pool: &PgPoolSquad) -> Uuid {
    let mut conn = pool.get().expect("connection from pool");
    insert_into(profiles::table)
        .values((
            profiles::email.eq(unique_email("trainer")),
            profiles::is_trainer.eq(true),
        ))
        .returning(profiles::id)
        .get_result::<Uuid>(&mut conn)
        .expect("insert trainer")
}

#[allow(dead_code)]
pub fn insert_session(pool: &PgPoolSquad, trainer_id: Uuid, capacity: i32) -> Uuid {
    insert_session_at(pool, trainer_id, capacity, Utc::now() + Duration::days(1))
}

#[allow(dead_code)]
pub fn insert_session_at(
    pool: &PgPoolSquad,
    trainer_id: Uuid,
    capacity: i32,
    starts_at: DateTime<Utc>,
) -> Uuid {
    let mut conn = pool.get().expect("connection from pool");
    insert_into(sessions::table)
        .values((
            sessions::trainer_id.eq(trainer_id),
            sessions::starts_at.eq(starts_at),
            sessions::duration_minutes.eq(60),
            sessions::capacity.eq(capacity),
            sessions::session_type.eq("group"),
        ))
        .returning(sessions::id)
        .get_result::<Uuid>(&mut conn)
        .expect("insert session")
}
