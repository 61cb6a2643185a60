// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use backoff::ExponentialBackoff;
use clap::Parser;
use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;

use crate::errors::WarehouseError;

pub type PgConnectionPool = diesel::r2d2::Pool<ConnectionManager<PgConnection>>;
pub type PgPoolConnection = diesel::r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Process-wide configuration, sourced from CLI flags with environment fallbacks
/// (SPEC_FULL.md §C13). Mirrors the shape of the source's `Settings` object.
#[derive(Parser, Clone, Debug)]
#[clap(
    name = "my-warehouse-indexer",
    about = "Multi-tenant warehouse/inventory backend with offline sync",
    rename_all = "kebab-case"
)]
pub struct AppConfig {
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[clap(long, env = "APP_NAME", default_value = "my-warehouse")]
    pub app_name: String,

    #[clap(long, env = "API_V1_PREFIX", default_value = "/api/v1")]
    pub api_v1_prefix: String,

    #[clap(long, env = "JWT_SECRET")]
    pub jwt_secret: String,

    #[clap(long, env = "JWT_ALGORITHM", default_value = "HS256")]
    pub jwt_algorithm: String,

    #[clap(long, env = "ACCESS_TOKEN_MINUTES", default_value = "30")]
    pub access_token_minutes: i64,

    #[clap(long, env = "REFRESH_TOKEN_DAYS", default_value = "30")]
    pub refresh_token_days: i64,

    #[clap(long, env = "FRONTEND_URL", default_value = "http://localhost:5173")]
    pub frontend_url: String,

    #[clap(long, env = "SECRET_ENCRYPTION_KEY")]
    pub secret_encryption_key: String,

    #[clap(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub server_host: String,

    #[clap(long, env = "SERVER_PORT", default_value = "8000")]
    pub server_port: u16,

    #[clap(long, env = "METRICS_PORT", default_value = "9184")]
    pub metrics_port: u16,

    /// Exposes the password-reset token in the forgot-password response body instead of
    /// emailing it, for local development (SPEC_FULL.md §4.7 dev-bootstrap note).
    #[clap(long, env = "DEV_EXPOSE_RESET_TOKEN")]
    pub dev_expose_reset_token: bool,
}

pub fn new_pg_connection_pool(db_url: &str) -> Result<PgConnectionPool, WarehouseError> {
    let manager = ConnectionManager::<PgConnection>::new(db_url);
    diesel::r2d2::Pool::builder().build(manager).map_err(|e| {
        WarehouseError::PgConnectionPoolInitError(format!(
            "failed to initialize connection pool: {e:?}"
        ))
    })
}

pub fn get_pg_pool_connection(pool: &PgConnectionPool) -> Result<PgPoolConnection, WarehouseError> {
    backoff::retry(ExponentialBackoff::default(), || {
        let pool_conn = pool.get()?;
        Ok(pool_conn)
    })
    .map_err(|e: backoff::Error<diesel::r2d2::PoolError>| {
        WarehouseError::PgPoolConnectionError(format!(
            "failed to get connection from pg connection pool: {e:?}"
        ))
    })
}
