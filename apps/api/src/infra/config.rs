use std::{net::SocketAddr, path::PathBuf, time::Duration};

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;

pub struct AppConfig {
    /// HS256 key shared with the auth service that issues access tokens.
    pub jwt_secret: SecretString,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    /// How often the background sweeper expires and promotes items.
    pub sweep_interval: Duration,
    /// Optional JSON log file, in addition to console output.
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET").into());

        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");
        let database_max_connections: u32 = get_env_default("DATABASE_MAX_CONNECTIONS", 5);
        let sweep_interval_secs: u64 = get_env_default("SWEEP_INTERVAL_SECS", 300);
        let log_file: Option<PathBuf> = std::env::var("LOG_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self {
            jwt_secret,
            cors_origin,
            bind_addr,
            database_url,
            database_max_connections,
            sweep_interval: Duration::from_secs(sweep_interval_secs.max(1)),
            log_file,
        }
    }
}
