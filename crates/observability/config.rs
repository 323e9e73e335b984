use std::env;

#[derive(Clone, Debug)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Clone, Debug)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    pub(crate) default_filter: String,
    pub(crate) ansi: bool,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        let component = component.trim().to_string();

        let service_name = env_string("SERVICE_NAME").unwrap_or_else(|| component.clone());

        let environment = env_string("STAGE").unwrap_or_else(|| "unknown".to_string());

        // Used only when RUST_LOG is unset.
        let default_filter = env_string("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let ansi = env_bool("LOG_ANSI").unwrap_or(true);

        Self {
            service_context: ServiceContext {
                service_name,
                environment,
                component,
            },
            default_filter,
            ansi,
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_bool(key: &str) -> Option<bool> {
    let raw = env::var(key).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
