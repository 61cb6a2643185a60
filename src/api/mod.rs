// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

pub mod auth;
pub mod boxes;
pub mod items;
pub mod settings;
pub mod sync;
pub mod tags;
pub mod transfer;
pub mod warehouses;

use axum::Router;

use crate::state::AppState;

/// Assembles every route group under a single router (SPEC_FULL.md §6).
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(warehouses::router())
        .merge(boxes::router())
        .merge(items::router())
        .merge(tags::router())
        .merge(sync::router())
        .merge(transfer::router())
        .merge(settings::router())
}
