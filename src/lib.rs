// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

pub mod api;
pub mod config;
pub mod errors;
pub mod extractors;
pub mod metrics;
pub mod models;
pub mod schema;
pub mod services;
pub mod state;

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::state::AppState;

/// Builds the full HTTP application: every `api::*` route group nested under the
/// configured API prefix, with request tracing and CORS applied process-wide
/// (SPEC_FULL.md §6).
pub fn build_app(state: AppState, config: &AppConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST, Method::PATCH, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .nest(&config.api_v1_prefix, api::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), track_http_metrics))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

async fn track_http_metrics(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let method = req.method().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    state
        .metrics
        .http_requests_total
        .with_label_values(&[&route, &method, &status])
        .inc();
    state
        .metrics
        .http_request_duration_seconds
        .with_label_values(&[&route, &method])
        .observe(start.elapsed().as_secs_f64());

    response
}
