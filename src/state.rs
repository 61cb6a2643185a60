// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use crate::config::{get_pg_pool_connection, AppConfig, PgConnectionPool, PgPoolConnection};
use crate::errors::WarehouseError;
use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgConnectionPool,
    pub config: Arc<AppConfig>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(pool: PgConnectionPool, config: AppConfig, metrics: Metrics) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            metrics: Arc::new(metrics),
        }
    }

    pub fn conn(&self) -> Result<PgPoolConnection, WarehouseError> {
        get_pg_pool_connection(&self.pool)
    }
}
