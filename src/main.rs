// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use prometheus::{Registry, TextEncoder};
use tracing::info;

use my_warehouse_indexer::config::{new_pg_connection_pool, AppConfig};
use my_warehouse_indexer::metrics::Metrics;
use my_warehouse_indexer::state::AppState;
use my_warehouse_indexer::build_app;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let config = AppConfig::parse();

    let registry = Registry::new();
    let metrics = Metrics::new(&registry);

    let pool = new_pg_connection_pool(&config.database_url)?;

    {
        let mut conn = my_warehouse_indexer::config::get_pg_pool_connection(&pool)?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("failed to run pending migrations: {e}"))?;
    }

    let state = AppState::new(pool, config.clone(), metrics);

    let metrics_addr = SocketAddr::new(config.server_host.parse()?, config.metrics_port);
    tokio::spawn(start_metrics_server(metrics_addr, registry));

    let app = build_app(state, &config);
    let addr = SocketAddr::new(config.server_host.parse()?, config.server_port);
    info!("{} listening on {addr}", config.app_name);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Serves `/metrics` on its own port so scraping never competes with API traffic
/// (SPEC_FULL.md §6 ambient Metrics section, grounded on the teacher's Prometheus exporter).
async fn start_metrics_server(addr: SocketAddr, registry: Registry) {
    let app = Router::new()
        .route("/metrics", get(serve_metrics))
        .with_state(registry);

    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("metrics listening on {addr}");
            if let Err(err) = axum::serve(listener, app).await {
                tracing::warn!(?err, "metrics server exited");
            }
        }
        Err(err) => tracing::warn!(?err, "failed to bind metrics listener"),
    }
}

async fn serve_metrics(State(registry): State<Registry>) -> (StatusCode, String) {
    let metric_families = registry.gather();
    match TextEncoder.encode_to_string(&metric_families) {
        Ok(body) => (StatusCode::OK, body),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("unable to encode metrics: {err}"),
        ),
    }
}
