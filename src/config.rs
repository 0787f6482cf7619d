use std::sync::Arc;

use chrono::Duration;

use crate::engine::{Engine, TokenPolicy};

/// Server configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub hostname: String,
    pub port: u16,
    pub access_token_duration_secs: i64,
    pub refresh_token_duration_secs: i64,
    pub client_secret_duration_secs: i64,
    pub admin_username: String,
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            hostname: std::env::var("SERVER_HOSTNAME")
                .unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            access_token_duration_secs: std::env::var("ACCESS_TOKEN_DURATION_SECS")
                .unwrap_or_else(|_| "3600".to_string()) // 1 hour
                .parse()?,
            refresh_token_duration_secs: std::env::var("REFRESH_TOKEN_DURATION_SECS")
                .unwrap_or_else(|_| "86400".to_string()) // 24 hours
                .parse()?,
            client_secret_duration_secs: std::env::var("CLIENT_SECRET_DURATION_SECS")
                .unwrap_or_else(|_| "3600".to_string()) // 1 hour
                .parse()?,
            admin_username: std::env::var("ADMIN_USERNAME")
                .unwrap_or_else(|_| "admin".to_string()),
            admin_password: std::env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| "changeme".to_string()),
        })
    }

    /// The issuer identity placed in introspection responses
    pub fn issuer(&self) -> String {
        format!("https://{}:{}", self.hostname, self.port)
    }

    pub fn policy(&self) -> TokenPolicy {
        TokenPolicy {
            issuer: self.issuer(),
            access_duration: Duration::seconds(self.access_token_duration_secs),
            refresh_duration: Duration::seconds(self.refresh_token_duration_secs),
            client_secret_duration: Duration::seconds(self.client_secret_duration_secs),
        }
    }

    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("0.0.0.0:{}", self.port)
            .parse()
            .expect("Invalid socket address")
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let engine = Engine::new(config.policy());
        Self {
            engine,
            config: Arc::new(config),
        }
    }
}
