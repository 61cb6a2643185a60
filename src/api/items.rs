// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use std::collections::{HashMap, HashSet};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::errors::{WarehouseError, WarehouseResult};
use crate::extractors::{CurrentUser, WarehouseMembership};
use crate::models::box_record::BoxRecord;
use crate::models::item::{strings_to_json, Item, ItemFavorite, ItemResponse, NewItem, NewItemFavorite};
use crate::models::stock_movement::{NewStockMovement, StockAdjustResponse};
use crate::schema::{boxes, item_favorites, items, stock_movements};
use crate::services::activity::record_activity;
use crate::services::relevance::score_item;
use crate::services::sync_log::append_change_log;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/warehouses/:warehouse_id/items", get(list_items).post(create_item))
        .route(
            "/warehouses/:warehouse_id/items/:item_id",
            get(get_item_handler).patch(update_item).delete(delete_item),
        )
        .route("/warehouses/:warehouse_id/items/:item_id/restore", post(restore_item))
        .route("/warehouses/:warehouse_id/items/:item_id/favorite", post(set_favorite))
        .route("/warehouses/:warehouse_id/items/:item_id/stock", post(adjust_stock))
        .route("/warehouses/:warehouse_id/items/batch", post(batch_action))
}

fn get_item(conn: &mut PgConnection, warehouse_id: Uuid, item_id: Uuid, include_deleted: bool) -> WarehouseResult<Item> {
    let mut query = items::table
        .find(item_id)
        .filter(items::warehouse_id.eq(warehouse_id))
        .into_boxed();
    if !include_deleted {
        query = query.filter(items::deleted_at.is_null());
    }
    query
        .first(conn)
        .optional()?
        .ok_or_else(|| WarehouseError::NotFound("item not found".to_string()))
}

fn get_active_box(conn: &mut PgConnection, warehouse_id: Uuid, box_id: Uuid) -> WarehouseResult<BoxRecord> {
    boxes::table
        .find(box_id)
        .filter(boxes::warehouse_id.eq(warehouse_id))
        .filter(boxes::deleted_at.is_null())
        .first(conn)
        .optional()?
        .ok_or_else(|| WarehouseError::InvalidInput("box not found or deleted".to_string()))
}

fn box_path_map(conn: &mut PgConnection, warehouse_id: Uuid) -> WarehouseResult<HashMap<Uuid, Vec<String>>> {
    let rows: Vec<BoxRecord> = boxes::table.filter(boxes::warehouse_id.eq(warehouse_id)).load(conn)?;
    let by_id: HashMap<Uuid, BoxRecord> = rows.into_iter().map(|b| (b.id, b)).collect();
    let mut cache: HashMap<Uuid, Vec<String>> = HashMap::new();
    for box_id in by_id.keys().copied().collect::<Vec<_>>() {
        if cache.contains_key(&box_id) {
            continue;
        }
        let mut path = Vec::new();
        let mut cursor = Some(box_id);
        let mut guard = 0;
        while let Some(id) = cursor {
            guard += 1;
            if guard > 128 {
                break;
            }
            let Some(b) = by_id.get(&id) else { break };
            path.push(b.name.clone());
            cursor = b.parent_box_id;
        }
        path.reverse();
        cache.insert(box_id, path);
    }
    Ok(cache)
}

fn favorite_ids(conn: &mut PgConnection, user_id: Uuid, item_ids: &[Uuid]) -> WarehouseResult<HashSet<Uuid>> {
    if item_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let rows: Vec<ItemFavorite> = item_favorites::table
        .filter(item_favorites::user_id.eq(user_id))
        .filter(item_favorites::item_id.eq_any(item_ids))
        .load(conn)?;
    Ok(rows.into_iter().map(|r| r.item_id).collect())
}

fn stock_for(conn: &mut PgConnection, item_ids: &[Uuid]) -> WarehouseResult<HashMap<Uuid, i64>> {
    if item_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let deltas: Vec<(Uuid, i32)> = stock_movements::table
        .filter(stock_movements::item_id.eq_any(item_ids))
        .select((stock_movements::item_id, stock_movements::delta))
        .load(conn)?;
    let mut totals: HashMap<Uuid, i64> = HashMap::new();
    for (item_id, delta) in deltas {
        *totals.entry(item_id).or_insert(0) += delta as i64;
    }
    Ok(totals)
}

#[derive(Deserialize, Default)]
struct ItemListQuery {
    q: Option<String>,
    tag: Option<String>,
    #[serde(default)]
    favorites_only: bool,
    #[serde(default)]
    stock_zero: bool,
    with_photo: Option<bool>,
    #[serde(default)]
    include_deleted: bool,
}

async fn list_items(
    State(state): State<AppState>,
    WarehouseMembership { user, .. }: WarehouseMembership,
    Path(warehouse_id): Path<Uuid>,
    Query(query): Query<ItemListQuery>,
) -> WarehouseResult<Json<Vec<ItemResponse>>> {
    let mut conn = state.conn()?;

    let mut db_query = items::table.filter(items::warehouse_id.eq(warehouse_id)).into_boxed();
    if !query.include_deleted {
        db_query = db_query.filter(items::deleted_at.is_null());
    }
    if let Some(with_photo) = query.with_photo {
        db_query = if with_photo {
            db_query.filter(items::photo_url.is_not_null())
        } else {
            db_query.filter(items::photo_url.is_null())
        };
    }
    let mut loaded: Vec<Item> = db_query.load(&mut conn)?;

    if let Some(tag) = query.tag.as_deref() {
        let needle = tag.trim().to_lowercase();
        loaded.retain(|item| item.tags_vec().iter().any(|t| t.to_lowercase() == needle));
    }

    let paths = box_path_map(&mut conn, warehouse_id)?;

    let ordered: Vec<Item> = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => {
            let normalized_q = q.to_lowercase();
            let mut scored: Vec<(u32, Item)> = loaded
                .into_iter()
                .map(|item| {
                    let path_text = paths.get(&item.box_id).cloned().unwrap_or_default().join(" > ").to_lowercase();
                    let score = score_item(&item, &normalized_q, &path_text);
                    (score, item)
                })
                .filter(|(score, _)| *score > 0)
                .collect();
            scored.sort_by(|(sa, a), (sb, b)| {
                sb.cmp(sa)
                    .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                    .then_with(|| b.created_at.cmp(&a.created_at))
            });
            scored.into_iter().map(|(_, item)| item).collect()
        }
        None => {
            loaded.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            loaded
        }
    };

    let item_ids: Vec<Uuid> = ordered.iter().map(|i| i.id).collect();
    let stocks = stock_for(&mut conn, &item_ids)?;
    let favorites = favorite_ids(&mut conn, user.id, &item_ids)?;

    let mut responses: Vec<ItemResponse> = ordered
        .into_iter()
        .map(|item| {
            let stock = *stocks.get(&item.id).unwrap_or(&0);
            let is_favorite = favorites.contains(&item.id);
            let path = paths.get(&item.box_id).cloned().unwrap_or_default();
            item.to_response(stock, is_favorite, path)
        })
        .collect();

    if query.favorites_only {
        responses.retain(|r| r.is_favorite);
    }
    if query.stock_zero {
        responses.retain(|r| r.stock == 0);
    }

    Ok(Json(responses))
}

#[derive(Deserialize)]
struct ItemCreateRequest {
    box_id: Uuid,
    name: String,
    description: Option<String>,
    photo_url: Option<String>,
    physical_location: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    aliases: Vec<String>,
}

async fn create_item(
    State(state): State<AppState>,
    WarehouseMembership { user, .. }: WarehouseMembership,
    Path(warehouse_id): Path<Uuid>,
    Json(payload): Json<ItemCreateRequest>,
) -> WarehouseResult<(StatusCode, Json<ItemResponse>)> {
    let mut conn = state.conn()?;
    let record: Item = conn.build_transaction().read_write().run(|conn| -> WarehouseResult<Item> {
        get_active_box(conn, warehouse_id, payload.box_id)?;

        let name = payload.name.trim();
        if name.is_empty() {
            return Err(WarehouseError::InvalidInput("name is required".to_string()));
        }

        let new_item = NewItem {
            id: Uuid::new_v4(),
            warehouse_id,
            box_id: payload.box_id,
            name: name.to_string(),
            description: payload.description.clone(),
            photo_url: payload.photo_url.clone(),
            physical_location: payload.physical_location.clone(),
            tags: strings_to_json(&payload.tags),
            aliases: strings_to_json(&payload.aliases),
        };
        let record: Item = diesel::insert_into(items::table).values(&new_item).get_result(conn)?;

        record_activity(
            conn,
            warehouse_id,
            user.id,
            "item.created",
            Some("item"),
            Some(record.id),
            Some(json!({"name": record.name})),
        )?;
        append_change_log(
            conn,
            warehouse_id,
            "item",
            "create",
            Some(record.id),
            Some(record.version),
            Some(json!({"name": record.name})),
        )?;

        Ok(record)
    })?;

    let path = box_path_map(&mut conn, warehouse_id)?.get(&record.box_id).cloned().unwrap_or_default();
    Ok((StatusCode::CREATED, Json(record.to_response(0, false, path))))
}

async fn get_item_handler(
    State(state): State<AppState>,
    WarehouseMembership { user, .. }: WarehouseMembership,
    Path((warehouse_id, item_id)): Path<(Uuid, Uuid)>,
) -> WarehouseResult<Json<ItemResponse>> {
    let mut conn = state.conn()?;
    let record = get_item(&mut conn, warehouse_id, item_id, false)?;
    let stock = *stock_for(&mut conn, &[record.id])?.get(&record.id).unwrap_or(&0);
    let is_favorite = favorite_ids(&mut conn, user.id, &[record.id])?.contains(&record.id);
    let path = box_path_map(&mut conn, warehouse_id)?.get(&record.box_id).cloned().unwrap_or_default();
    Ok(Json(record.to_response(stock, is_favorite, path)))
}

#[derive(Deserialize)]
struct ItemUpdateRequest {
    box_id: Option<Uuid>,
    name: Option<String>,
    description: Option<String>,
    photo_url: Option<String>,
    physical_location: Option<String>,
    tags: Option<Vec<String>>,
    aliases: Option<Vec<String>>,
}

async fn update_item(
    State(state): State<AppState>,
    WarehouseMembership { user, .. }: WarehouseMembership,
    Path((warehouse_id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ItemUpdateRequest>,
) -> WarehouseResult<Json<ItemResponse>> {
    let mut conn = state.conn()?;
    let record = conn.build_transaction().read_write().run(|conn| -> WarehouseResult<Item> {
        let mut record = get_item(conn, warehouse_id, item_id, false)?;

        let mut changed = false;
        if let Some(box_id) = payload.box_id {
            get_active_box(conn, warehouse_id, box_id)?;
            record.box_id = box_id;
            changed = true;
        }
        if let Some(name) = payload.name {
            record.name = name.trim().to_string();
            changed = true;
        }
        if let Some(description) = payload.description {
            record.description = Some(description);
            changed = true;
        }
        if let Some(photo_url) = payload.photo_url {
            record.photo_url = Some(photo_url);
            changed = true;
        }
        if let Some(physical_location) = payload.physical_location {
            record.physical_location = Some(physical_location);
            changed = true;
        }
        if let Some(tags) = payload.tags {
            record.tags = strings_to_json(&tags);
            changed = true;
        }
        if let Some(aliases) = payload.aliases {
            record.aliases = strings_to_json(&aliases);
            changed = true;
        }

        if changed {
            record.version += 1;
            record = diesel::update(items::table.find(item_id)).set(&record).get_result(conn)?;
            record_activity(
                conn,
                warehouse_id,
                user.id,
                "item.updated",
                Some("item"),
                Some(record.id),
                None,
            )?;
            append_change_log(conn, warehouse_id, "item", "update", Some(record.id), Some(record.version), None)?;
        }

        Ok(record)
    })?;

    let stock = *stock_for(&mut conn, &[record.id])?.get(&record.id).unwrap_or(&0);
    let is_favorite = favorite_ids(&mut conn, user.id, &[record.id])?.contains(&record.id);
    let path = box_path_map(&mut conn, warehouse_id)?.get(&record.box_id).cloned().unwrap_or_default();
    Ok(Json(record.to_response(stock, is_favorite, path)))
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn delete_item(
    State(state): State<AppState>,
    WarehouseMembership { user, .. }: WarehouseMembership,
    Path((warehouse_id, item_id)): Path<(Uuid, Uuid)>,
) -> WarehouseResult<Json<MessageResponse>> {
    let mut conn = state.conn()?;
    conn.build_transaction().read_write().run(|conn| -> WarehouseResult<()> {
        let mut record = get_item(conn, warehouse_id, item_id, false)?;
        record.deleted_at = Some(Utc::now());
        record.version += 1;
        diesel::update(items::table.find(item_id)).set(&record).execute(conn)?;

        record_activity(
            conn,
            warehouse_id,
            user.id,
            "item.deleted",
            Some("item"),
            Some(item_id),
            Some(json!({"name": record.name})),
        )?;
        append_change_log(conn, warehouse_id, "item", "delete", Some(item_id), Some(record.version), None)?;

        Ok(())
    })?;

    Ok(Json(MessageResponse {
        message: "Item moved to trash".to_string(),
    }))
}

async fn restore_item(
    State(state): State<AppState>,
    WarehouseMembership { user, .. }: WarehouseMembership,
    Path((warehouse_id, item_id)): Path<(Uuid, Uuid)>,
) -> WarehouseResult<Json<ItemResponse>> {
    let mut conn = state.conn()?;
    let record = conn.build_transaction().read_write().run(|conn| -> WarehouseResult<Item> {
        let mut record = get_item(conn, warehouse_id, item_id, true)?;
        if record.deleted_at.is_none() {
            return Ok(record);
        }

        get_active_box(conn, warehouse_id, record.box_id)?;
        record.deleted_at = None;
        record.version += 1;
        record = diesel::update(items::table.find(item_id)).set(&record).get_result(conn)?;

        record_activity(
            conn,
            warehouse_id,
            user.id,
            "item.restored",
            Some("item"),
            Some(record.id),
            Some(json!({"name": record.name})),
        )?;
        append_change_log(conn, warehouse_id, "item", "restore", Some(record.id), Some(record.version), None)?;

        Ok(record)
    })?;

    let stock = *stock_for(&mut conn, &[record.id])?.get(&record.id).unwrap_or(&0);
    let is_favorite = favorite_ids(&mut conn, user.id, &[record.id])?.contains(&record.id);
    let path = box_path_map(&mut conn, warehouse_id)?.get(&record.box_id).cloned().unwrap_or_default();
    Ok(Json(record.to_response(stock, is_favorite, path)))
}

#[derive(Deserialize)]
struct FavoriteRequest {
    is_favorite: bool,
}

async fn set_favorite(
    State(state): State<AppState>,
    WarehouseMembership { user, .. }: WarehouseMembership,
    Path((warehouse_id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<FavoriteRequest>,
) -> WarehouseResult<Json<ItemResponse>> {
    let mut conn = state.conn()?;
    let record = conn.build_transaction().read_write().run(|conn| -> WarehouseResult<Item> {
        let record = get_item(conn, warehouse_id, item_id, false)?;

        let existing: Option<ItemFavorite> = item_favorites::table.find((user.id, item_id)).first(conn).optional()?;
        match (payload.is_favorite, existing) {
            (true, None) => {
                diesel::insert_into(item_favorites::table)
                    .values(&NewItemFavorite { user_id: user.id, item_id })
                    .execute(conn)?;
            }
            (false, Some(_)) => {
                diesel::delete(item_favorites::table.find((user.id, item_id))).execute(conn)?;
            }
            _ => {}
        }

        record_activity(
            conn,
            warehouse_id,
            user.id,
            "item.favorite.set",
            Some("favorite"),
            Some(item_id),
            Some(json!({"user_id": user.id, "is_favorite": payload.is_favorite})),
        )?;
        append_change_log(
            conn,
            warehouse_id,
            "favorite",
            "set",
            Some(item_id),
            None,
            Some(json!({"user_id": user.id, "is_favorite": payload.is_favorite})),
        )?;

        Ok(record)
    })?;

    let stock = *stock_for(&mut conn, &[record.id])?.get(&record.id).unwrap_or(&0);
    let path = box_path_map(&mut conn, warehouse_id)?.get(&record.box_id).cloned().unwrap_or_default();
    Ok(Json(record.to_response(stock, payload.is_favorite, path)))
}

#[derive(Deserialize)]
struct StockAdjustRequest {
    delta: i32,
    command_id: String,
    note: Option<String>,
}

async fn adjust_stock(
    State(state): State<AppState>,
    WarehouseMembership { user, .. }: WarehouseMembership,
    Path((warehouse_id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<StockAdjustRequest>,
) -> WarehouseResult<Json<StockAdjustResponse>> {
    if payload.delta != 1 && payload.delta != -1 {
        return Err(WarehouseError::InvalidInput("delta must be 1 or -1".to_string()));
    }
    if payload.command_id.len() < 6 {
        return Err(WarehouseError::InvalidInput("command_id must be at least 6 characters".to_string()));
    }
    let mut conn = state.conn()?;
    conn.build_transaction().read_write().run(|conn| -> WarehouseResult<()> {
        get_item(conn, warehouse_id, item_id, false)?;

        let existing: Option<crate::models::stock_movement::StockMovement> = stock_movements::table
            .filter(stock_movements::item_id.eq(item_id))
            .filter(stock_movements::command_id.eq(&payload.command_id))
            .first(conn)
            .optional()?;

        if existing.is_none() {
            let row = NewStockMovement {
                id: Uuid::new_v4(),
                warehouse_id,
                item_id,
                delta: payload.delta,
                command_id: payload.command_id.clone(),
                note: payload.note.clone(),
            };
            let inserted = diesel::insert_into(stock_movements::table).values(&row).execute(conn);
            if inserted.is_ok() {
                append_change_log(
                    conn,
                    warehouse_id,
                    "stock",
                    "adjust",
                    Some(item_id),
                    None,
                    Some(json!({"delta": payload.delta, "command_id": payload.command_id})),
                )?;
            }
        }
        Ok(())
    })?;

    let stock = *stock_for(&mut conn, &[item_id])?.get(&item_id).unwrap_or(&0);
    Ok(Json(StockAdjustResponse { item_id, stock }))
}

#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum BatchAction {
    Move { box_id: Uuid },
    Favorite,
    Unfavorite,
    Delete,
}

#[derive(Deserialize)]
struct BatchActionRequest {
    item_ids: Vec<Uuid>,
    #[serde(flatten)]
    action: BatchAction,
}

#[derive(Serialize)]
struct BatchActionResponse {
    affected: usize,
}

async fn batch_action(
    State(state): State<AppState>,
    WarehouseMembership { user, .. }: WarehouseMembership,
    Path(warehouse_id): Path<Uuid>,
    Json(payload): Json<BatchActionRequest>,
) -> WarehouseResult<Json<BatchActionResponse>> {
    let mut conn = state.conn()?;
    let affected = conn.build_transaction().read_write().run(|conn| -> WarehouseResult<usize> {
        let requested: HashSet<Uuid> = payload.item_ids.iter().copied().collect();
        let loaded: Vec<Item> = items::table
            .filter(items::warehouse_id.eq(warehouse_id))
            .filter(items::id.eq_any(&payload.item_ids))
            .filter(items::deleted_at.is_null())
            .load(conn)?;
        let found: HashSet<Uuid> = loaded.iter().map(|i| i.id).collect();
        if found != requested {
            return Err(WarehouseError::InvalidInput(
                "one or more items were not found or have been deleted".to_string(),
            ));
        }

        match &payload.action {
            BatchAction::Move { box_id } => {
                get_active_box(conn, warehouse_id, *box_id)?;
                for item in &loaded {
                    let new_version = item.version + 1;
                    diesel::update(items::table.find(item.id))
                        .set((items::box_id.eq(*box_id), items::version.eq(new_version)))
                        .execute(conn)?;
                    append_change_log(conn, warehouse_id, "item", "update", Some(item.id), Some(new_version), None)?;
                }
            }
            BatchAction::Favorite | BatchAction::Unfavorite => {
                let is_favorite = matches!(&payload.action, BatchAction::Favorite);
                for item in &loaded {
                    let existing: Option<ItemFavorite> = item_favorites::table.find((user.id, item.id)).first(conn).optional()?;
                    match (is_favorite, existing) {
                        (true, None) => {
                            diesel::insert_into(item_favorites::table)
                                .values(&NewItemFavorite { user_id: user.id, item_id: item.id })
                                .execute(conn)?;
                        }
                        (false, Some(_)) => {
                            diesel::delete(item_favorites::table.find((user.id, item.id))).execute(conn)?;
                        }
                        _ => {}
                    }
                    append_change_log(
                        conn,
                        warehouse_id,
                        "favorite",
                        "set",
                        Some(item.id),
                        None,
                        Some(json!({"user_id": user.id, "is_favorite": is_favorite})),
                    )?;
                }
            }
            BatchAction::Delete => {
                let now = Utc::now();
                for item in &loaded {
                    let new_version = item.version + 1;
                    diesel::update(items::table.find(item.id))
                        .set((items::deleted_at.eq(now), items::version.eq(new_version)))
                        .execute(conn)?;
                    append_change_log(conn, warehouse_id, "item", "delete", Some(item.id), Some(new_version), None)?;
                }
            }
        }

        record_activity(
            conn,
            warehouse_id,
            user.id,
            "item.batch_action",
            Some("item"),
            None,
            Some(json!({"count": loaded.len()})),
        )?;

        Ok(loaded.len())
    })?;

    Ok(Json(BatchActionResponse { affected }))
}
