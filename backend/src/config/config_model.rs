#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub supabase: Supabase,
    pub stripe: Stripe,
    pub membership: MembershipPolling,
    pub push: Push,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub webhook_secret: String,
}

/// Post-checkout wait for the membership webhook to land.
#[derive(Debug, Clone)]
pub struct MembershipPolling {
    pub attempts: u32,
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Push {
    pub request_timeout_secs: u64,
}
