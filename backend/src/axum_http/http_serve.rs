use crate::{
    auth::JwtSecret,
    axum_http::{
        default_routers,
        routers::{self, PushDispatcher, PushNotifier},
    },
    config::config_model::DotEnvyConfig,
    usecases::notifications::{DetachedDispatcher, NotificationDispatcher},
};
use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::infra::{
    db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::push_endpoints::PushEndpointPostgres,
    },
    push::web_push_client::WebPushClient,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let push_client = WebPushClient::new(Duration::from_secs(config.push.request_timeout_secs))?;
    let dispatcher: Arc<PushDispatcher> = Arc::new(NotificationDispatcher::new(
        Arc::new(PushEndpointPostgres::new(Arc::clone(&db_pool))),
        Arc::new(push_client),
    ));
    let notifier: Arc<PushNotifier> = Arc::new(DetachedDispatcher::new(Arc::clone(&dispatcher)));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/bookings",
            routers::bookings::routes(Arc::clone(&db_pool), Arc::clone(&notifier)),
        )
        .nest(
            "/api/v1/sessions",
            routers::bookings::session_routes(Arc::clone(&db_pool), Arc::clone(&notifier)),
        )
        .nest(
            "/api/v1/guest/bookings",
            routers::guest_bookings::routes(Arc::clone(&db_pool), Arc::clone(&notifier)),
        )
        .nest(
            "/api/v1/accounts",
            routers::accounts::routes(Arc::clone(&db_pool)),
        )
        .nest(
            "/api/v1/push/endpoints",
            routers::push_endpoints::routes(Arc::clone(&dispatcher)),
        )
        .nest(
            "/api/v1/memberships",
            routers::memberships::routes(Arc::clone(&db_pool), &config),
        )
        .nest("/api/v1/access", routers::access::routes(Arc::clone(&db_pool)))
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(JwtSecret(Arc::from(
            config.supabase.jwt_secret.as_str(),
        ))))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
