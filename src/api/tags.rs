// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::WarehouseResult;
use crate::extractors::WarehouseMembership;
use crate::models::item::Item;
use crate::schema::items;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/warehouses/:warehouse_id/tags", get(list_tags))
        .route("/warehouses/:warehouse_id/tags/cloud", get(tag_cloud))
}

#[derive(Serialize)]
struct TagResponse {
    name: String,
}

#[derive(Serialize)]
struct TagCloudEntry {
    tag: String,
    count: i64,
}

async fn list_tags(
    State(state): State<AppState>,
    _membership: WarehouseMembership,
    Path(warehouse_id): Path<Uuid>,
) -> WarehouseResult<Json<Vec<TagResponse>>> {
    let mut conn = state.conn()?;
    let live_items: Vec<Item> = items::table
        .filter(items::warehouse_id.eq(warehouse_id))
        .filter(items::deleted_at.is_null())
        .load(&mut conn)?;

    let mut tags: std::collections::BTreeSet<String> = Default::default();
    for item in &live_items {
        for tag in item.tags_vec() {
            let trimmed = tag.trim().to_string();
            if !trimmed.is_empty() {
                tags.insert(trimmed);
            }
        }
    }
    Ok(Json(tags.into_iter().map(|name| TagResponse { name }).collect()))
}

async fn tag_cloud(
    State(state): State<AppState>,
    _membership: WarehouseMembership,
    Path(warehouse_id): Path<Uuid>,
) -> WarehouseResult<Json<Vec<TagCloudEntry>>> {
    let mut conn = state.conn()?;
    let live_items: Vec<Item> = items::table
        .filter(items::warehouse_id.eq(warehouse_id))
        .filter(items::deleted_at.is_null())
        .load(&mut conn)?;

    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for item in &live_items {
        for tag in item.tags_vec() {
            let trimmed = tag.trim().to_string();
            if trimmed.is_empty() {
                continue;
            }
            *counts.entry(trimmed).or_insert(0) += 1;
        }
    }

    let mut entries: Vec<TagCloudEntry> = counts
        .into_iter()
        .map(|(tag, count)| TagCloudEntry { tag, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.to_lowercase().cmp(&b.tag.to_lowercase())));
    Ok(Json(entries))
}
