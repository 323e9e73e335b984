use anyhow::{Context, Result};
use std::{env, str::FromStr};

use super::config_model::{
    BackendServer, Database, DotEnvyConfig, MembershipPolling, Push, Stripe, Supabase,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required_parsed("SERVER_PORT_BACKEND")?,
        body_limit: required_parsed("SERVER_BODY_LIMIT")?,
        timeout: required_parsed("SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        pool_size: optional_parsed("DATABASE_POOL_SIZE", 10)?,
    };

    let supabase = Supabase {
        jwt_secret: required("SUPABASE_JWT_SECRET")?,
    };

    let stripe = Stripe {
        webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
    };

    let membership = MembershipPolling {
        attempts: optional_parsed("MEMBERSHIP_POLL_ATTEMPTS", 5)?,
        base_delay_ms: optional_parsed("MEMBERSHIP_POLL_BASE_DELAY_MS", 500)?,
    };

    let push = Push {
        request_timeout_secs: optional_parsed("PUSH_REQUEST_TIMEOUT_SECS", 5)?,
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        supabase,
        stripe,
        membership,
        push,
    })
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{} is invalid", key))
}

fn required_parsed<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    required(key)?
        .trim()
        .parse()
        .with_context(|| format!("{} is invalid", key))
}

fn optional_parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} is invalid", key)),
        _ => Ok(default),
    }
}
