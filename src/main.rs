mod config;
mod dto;
mod engine;
mod error;
mod handlers;
mod models;
mod repositories;
mod services;
mod utils;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppState, Config};
use crate::handlers::clients::{
    delete_client_handler, get_client_handler, list_clients_handler, register_client_handler,
    replace_client_handler,
};
use crate::handlers::oauth::{
    approve_handler, authorize_handler, introspect_handler, revoke_handler, token_handler,
};
use crate::handlers::owners::{
    create_owner_handler, delete_owner_handler, get_owner_handler, list_owners_handler,
    replace_owner_handler,
};

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Create the application router with all routes configured
///
/// # Routes
///
/// ## OAuth2 endpoints
/// - GET  /oauth/authorize   - authorization endpoint (owner-authenticated)
/// - POST /oauth/approve     - consent decision, redirects to the client
/// - POST /oauth/token       - token endpoint (client-authenticated)
/// - POST /oauth/introspect  - token introspection (admins or clients)
/// - POST /oauth/revoke      - token revocation (client-authenticated)
///
/// ## Client registration and management
/// - POST   /oauth/clients       - dynamic registration
/// - GET    /oauth/clients       - list (admin)
/// - GET    /oauth/clients/{id}  - fetch (registrant or admin)
/// - PUT    /oauth/clients/{id}  - replace metadata (registrant or admin)
/// - DELETE /oauth/clients/{id}  - delete (registrant or admin)
///
/// ## Owner management
/// - POST   /owners       - create (admin)
/// - GET    /owners       - list (admin)
/// - GET    /owners/{id}  - fetch (admin or self)
/// - PUT    /owners/{id}  - replace attributes (admin or self)
/// - DELETE /owners/{id}  - delete (admin)
pub fn create_router(state: AppState) -> Router {
    let oauth_routes = Router::new()
        .route("/authorize", get(authorize_handler))
        .route("/approve", post(approve_handler))
        .route("/token", post(token_handler))
        .route("/introspect", post(introspect_handler))
        .route("/revoke", post(revoke_handler))
        .route(
            "/clients",
            post(register_client_handler).get(list_clients_handler),
        )
        .route(
            "/clients/:client_id",
            get(get_client_handler)
                .put(replace_client_handler)
                .delete(delete_client_handler),
        );

    let owner_routes = Router::new()
        .route("/", post(create_owner_handler).get(list_owners_handler))
        .route(
            "/:owner_id",
            get(get_owner_handler)
                .put(replace_owner_handler)
                .delete(delete_owner_handler),
        );

    Router::new()
        .route("/health", get(health_handler))
        .nest("/oauth", oauth_routes)
        .nest("/owners", owner_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                ])
                .max_age(Duration::from_secs(3600)),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iam_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let addr = config.socket_addr();

    // Create the engine and bootstrap the administrator
    let state = AppState::new(config);
    state
        .engine
        .owners
        .bootstrap_admin(&state.config.admin_username, &state.config.admin_password)
        .await
        .map_err(|e| anyhow::anyhow!("admin bootstrap failed: {}", e))?;

    // Build router
    let app = create_router(state);

    tracing::info!(
        "IAM server v{} listening on {}",
        env!("CARGO_PKG_VERSION"),
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
