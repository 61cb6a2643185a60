// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry, HistogramVec,
    IntCounterVec, Registry,
};

/// Request-level counters and latency histogram, registered against one process-wide
/// `Registry` (SPEC_FULL.md §C12).
pub struct Metrics {
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub sync_push_commands_total: IntCounterVec,
    pub sync_conflicts_total: IntCounterVec,
}

impl Metrics {
    pub fn new(registry: &Registry) -> Self {
        Self {
            http_requests_total: register_int_counter_vec_with_registry!(
                "warehouse_http_requests_total",
                "Count of HTTP requests by route and status class",
                &["route", "method", "status"],
                registry
            )
            .unwrap(),
            http_request_duration_seconds: register_histogram_vec_with_registry!(
                "warehouse_http_request_duration_seconds",
                "HTTP request latency by route",
                &["route", "method"],
                registry
            )
            .unwrap(),
            sync_push_commands_total: register_int_counter_vec_with_registry!(
                "warehouse_sync_push_commands_total",
                "Sync commands processed, by outcome",
                &["outcome"],
                registry
            )
            .unwrap(),
            sync_conflicts_total: register_int_counter_vec_with_registry!(
                "warehouse_sync_conflicts_total",
                "Sync conflicts created, by entity type",
                &["entity_type"],
                registry
            )
            .unwrap(),
        }
    }
}
