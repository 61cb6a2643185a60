// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0
//
// Warehouse export/import (SPEC_FULL.md §4.6). Import remaps ids that collide with a
// box/item/movement already owned by a *different* warehouse, inserts boxes in parent-first
// order via a repeated-scan topological pass, and leaves already-present ids untouched when
// they belong to the target warehouse (making re-import idempotent).

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::errors::{WarehouseError, WarehouseResult};
use crate::extractors::{CurrentUser, WarehouseMembership};
use crate::models::box_record::BoxRecord;
use crate::models::item::{strings_to_json, Item};
use crate::models::stock_movement::StockMovement;
use crate::models::warehouse::Warehouse;
use crate::schema::{boxes, items, stock_movements, warehouses};
use crate::services::sync_log::append_change_log;
use crate::state::AppState;

const SCHEMA_VERSION: i32 = 1;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/warehouses/:warehouse_id/export", get(export_warehouse))
        .route("/warehouses/:warehouse_id/import", post(import_warehouse))
}

fn new_short_code() -> String {
    let bytes: [u8; 3] = rand::thread_rng().gen();
    format!("BX-{}", hex::encode(bytes).to_uppercase())
}

fn new_qr_token() -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    let bytes: [u8; 24] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn get_warehouse(conn: &mut PgConnection, warehouse_id: Uuid) -> WarehouseResult<Warehouse> {
    warehouses::table
        .find(warehouse_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| WarehouseError::NotFound("warehouse not found".to_string()))
}

#[derive(Serialize)]
struct ExportWarehouseRef {
    id: Uuid,
    name: String,
}

#[derive(Serialize, Deserialize, Clone)]
struct TransferBox {
    id: Uuid,
    parent_box_id: Option<Uuid>,
    name: String,
    description: Option<String>,
    physical_location: Option<String>,
    qr_token: String,
    short_code: String,
    version: i32,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&BoxRecord> for TransferBox {
    fn from(b: &BoxRecord) -> Self {
        TransferBox {
            id: b.id,
            parent_box_id: b.parent_box_id,
            name: b.name.clone(),
            description: b.description.clone(),
            physical_location: b.physical_location.clone(),
            qr_token: b.qr_token.clone(),
            short_code: b.short_code.clone(),
            version: b.version,
            deleted_at: b.deleted_at,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
struct TransferItem {
    id: Uuid,
    box_id: Uuid,
    name: String,
    description: Option<String>,
    photo_url: Option<String>,
    physical_location: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    aliases: Vec<String>,
    version: i32,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Item> for TransferItem {
    fn from(i: &Item) -> Self {
        TransferItem {
            id: i.id,
            box_id: i.box_id,
            name: i.name.clone(),
            description: i.description.clone(),
            photo_url: i.photo_url.clone(),
            physical_location: i.physical_location.clone(),
            tags: i.tags_vec(),
            aliases: i.aliases_vec(),
            version: i.version,
            deleted_at: i.deleted_at,
            created_at: i.created_at,
            updated_at: i.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
struct TransferStockMovement {
    id: Uuid,
    item_id: Uuid,
    delta: i32,
    command_id: String,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&StockMovement> for TransferStockMovement {
    fn from(m: &StockMovement) -> Self {
        TransferStockMovement {
            id: m.id,
            item_id: m.item_id,
            delta: m.delta,
            command_id: m.command_id.clone(),
            note: m.note.clone(),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize)]
struct WarehouseExportResponse {
    schema_version: i32,
    exported_at: DateTime<Utc>,
    warehouse: ExportWarehouseRef,
    boxes: Vec<TransferBox>,
    items: Vec<TransferItem>,
    stock_movements: Vec<TransferStockMovement>,
}

async fn export_warehouse(
    State(state): State<AppState>,
    _membership: WarehouseMembership,
    Path(warehouse_id): Path<Uuid>,
) -> WarehouseResult<Json<WarehouseExportResponse>> {
    let mut conn = state.conn()?;
    let warehouse = get_warehouse(&mut conn, warehouse_id)?;

    let box_rows: Vec<BoxRecord> = boxes::table
        .filter(boxes::warehouse_id.eq(warehouse_id))
        .order(boxes::created_at.asc())
        .load(&mut conn)?;
    let item_rows: Vec<Item> = items::table
        .filter(items::warehouse_id.eq(warehouse_id))
        .order(items::created_at.asc())
        .load(&mut conn)?;
    let movement_rows: Vec<StockMovement> = stock_movements::table
        .filter(stock_movements::warehouse_id.eq(warehouse_id))
        .order(stock_movements::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(WarehouseExportResponse {
        schema_version: SCHEMA_VERSION,
        exported_at: Utc::now(),
        warehouse: ExportWarehouseRef {
            id: warehouse.id,
            name: warehouse.name,
        },
        boxes: box_rows.iter().map(TransferBox::from).collect(),
        items: item_rows.iter().map(TransferItem::from).collect(),
        stock_movements: movement_rows.iter().map(TransferStockMovement::from).collect(),
    }))
}

#[derive(Deserialize)]
struct WarehouseImportRequest {
    name: Option<String>,
    #[serde(default)]
    boxes: Vec<TransferBox>,
    #[serde(default)]
    items: Vec<TransferItem>,
    #[serde(default)]
    stock_movements: Vec<TransferStockMovement>,
}

#[derive(Serialize)]
struct WarehouseImportResponse {
    message: String,
    boxes_upserted: usize,
    items_upserted: usize,
    stock_movements_upserted: usize,
}

fn existing_box_owner(conn: &mut PgConnection, box_id: Uuid) -> WarehouseResult<Option<Uuid>> {
    Ok(boxes::table
        .find(box_id)
        .select(boxes::warehouse_id)
        .first(conn)
        .optional()?)
}

fn existing_item_owner(conn: &mut PgConnection, item_id: Uuid) -> WarehouseResult<Option<Uuid>> {
    Ok(items::table
        .find(item_id)
        .select(items::warehouse_id)
        .first(conn)
        .optional()?)
}

fn existing_movement_owner(conn: &mut PgConnection, movement_id: Uuid) -> WarehouseResult<Option<Uuid>> {
    Ok(stock_movements::table
        .find(movement_id)
        .select(stock_movements::warehouse_id)
        .first(conn)
        .optional()?)
}

async fn import_warehouse(
    State(state): State<AppState>,
    _membership: WarehouseMembership,
    CurrentUser(current_user): CurrentUser,
    Path(warehouse_id): Path<Uuid>,
    Json(payload): Json<WarehouseImportRequest>,
) -> WarehouseResult<Json<WarehouseImportResponse>> {
    let mut conn = state.conn()?;

    let (boxes_upserted, items_upserted, stock_movements_upserted) =
        conn.build_transaction().read_write().run(|conn| -> WarehouseResult<(usize, usize, usize)> {
            get_warehouse(conn, warehouse_id)?;

            let snapshot_box_ids: std::collections::HashSet<Uuid> = payload.boxes.iter().map(|b| b.id).collect();
            for b in &payload.boxes {
                if let Some(parent_id) = b.parent_box_id {
                    if !snapshot_box_ids.contains(&parent_id) {
                        let owner = existing_box_owner(conn, parent_id)?;
                        if owner != Some(warehouse_id) {
                            return Err(WarehouseError::InvalidInput(format!(
                                "parent box {parent_id} not found for box {}",
                                b.id
                            )));
                        }
                    }
                }
            }

            if let Some(name) = payload.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                diesel::update(warehouses::table.find(warehouse_id))
                    .set(warehouses::name.eq(name))
                    .execute(conn)?;
            }

            let mut box_id_map: HashMap<Uuid, Uuid> = HashMap::new();
            for b in &payload.boxes {
                let owner = existing_box_owner(conn, b.id)?;
                let mapped = match owner {
                    Some(owner_id) if owner_id == warehouse_id => b.id,
                    Some(_) => Uuid::new_v4(),
                    None => b.id,
                };
                box_id_map.insert(b.id, mapped);
            }

            let mut pending: HashMap<Uuid, TransferBox> = payload.boxes.iter().map(|b| (b.id, b.clone())).collect();
            let mut boxes_upserted = 0usize;

            while !pending.is_empty() {
                let ready: Vec<Uuid> = pending
                    .iter()
                    .filter(|(_, b)| match b.parent_box_id {
                        None => true,
                        Some(pid) => !pending.contains_key(&pid),
                    })
                    .map(|(id, _)| *id)
                    .collect();

                if ready.is_empty() {
                    return Err(WarehouseError::InvalidInput(
                        "cyclic or invalid box parent references".to_string(),
                    ));
                }

                for orig_id in ready {
                    let b = pending.remove(&orig_id).expect("key just observed in pending");
                    let mapped_box_id = box_id_map[&orig_id];
                    let mapped_parent_id = b.parent_box_id.map(|pid| *box_id_map.get(&pid).unwrap_or(&pid));

                    let existing: Option<BoxRecord> = boxes::table
                        .find(mapped_box_id)
                        .filter(boxes::warehouse_id.eq(warehouse_id))
                        .first(conn)
                        .optional()?;

                    if let Some(existing) = existing {
                        let qr_token = if b.qr_token != existing.qr_token {
                            let collision: Option<Uuid> = boxes::table
                                .filter(boxes::qr_token.eq(&b.qr_token))
                                .filter(boxes::id.ne(mapped_box_id))
                                .select(boxes::id)
                                .first(conn)
                                .optional()?;
                            if collision.is_some() {
                                existing.qr_token.clone()
                            } else {
                                b.qr_token.clone()
                            }
                        } else {
                            b.qr_token.clone()
                        };
                        diesel::update(boxes::table.find(mapped_box_id))
                            .set((
                                boxes::parent_box_id.eq(mapped_parent_id),
                                boxes::name.eq(&b.name),
                                boxes::description.eq(&b.description),
                                boxes::physical_location.eq(&b.physical_location),
                                boxes::qr_token.eq(qr_token),
                                boxes::short_code.eq(&b.short_code),
                                boxes::version.eq(b.version),
                                boxes::deleted_at.eq(b.deleted_at),
                            ))
                            .execute(conn)?;
                    } else {
                        let collision: Option<Uuid> =
                            boxes::table.filter(boxes::qr_token.eq(&b.qr_token)).select(boxes::id).first(conn).optional()?;
                        let (qr_token, short_code) = if collision.is_some() {
                            (new_qr_token(), new_short_code())
                        } else {
                            (b.qr_token.clone(), b.short_code.clone())
                        };
                        diesel::insert_into(boxes::table)
                            .values((
                                boxes::id.eq(mapped_box_id),
                                boxes::warehouse_id.eq(warehouse_id),
                                boxes::parent_box_id.eq(mapped_parent_id),
                                boxes::name.eq(&b.name),
                                boxes::description.eq(&b.description),
                                boxes::physical_location.eq(&b.physical_location),
                                boxes::qr_token.eq(qr_token),
                                boxes::short_code.eq(short_code),
                                boxes::version.eq(b.version),
                                boxes::deleted_at.eq(b.deleted_at),
                            ))
                            .execute(conn)?;
                    }

                    append_change_log(
                        conn,
                        warehouse_id,
                        "box",
                        "import",
                        Some(mapped_box_id),
                        Some(b.version),
                        Some(json!({"name": b.name})),
                    )?;
                    boxes_upserted += 1;
                }
            }

            let live_box_ids: std::collections::HashSet<Uuid> = boxes::table
                .filter(boxes::warehouse_id.eq(warehouse_id))
                .select(boxes::id)
                .load(conn)?
                .into_iter()
                .collect();

            let mut item_id_map: HashMap<Uuid, Uuid> = HashMap::new();
            for item in &payload.items {
                let owner = existing_item_owner(conn, item.id)?;
                let mapped = match owner {
                    Some(owner_id) if owner_id == warehouse_id => item.id,
                    Some(_) => Uuid::new_v4(),
                    None => item.id,
                };
                item_id_map.insert(item.id, mapped);
            }

            let mut items_upserted = 0usize;
            for item in &payload.items {
                let mapped_item_id = item_id_map[&item.id];
                let mapped_box_id = *box_id_map.get(&item.box_id).unwrap_or(&item.box_id);
                if !live_box_ids.contains(&mapped_box_id) {
                    return Err(WarehouseError::InvalidInput(format!(
                        "box {mapped_box_id} not found for item {}",
                        item.id
                    )));
                }

                let exists = items::table
                    .find(mapped_item_id)
                    .filter(items::warehouse_id.eq(warehouse_id))
                    .count()
                    .get_result::<i64>(conn)?
                    > 0;

                if exists {
                    diesel::update(items::table.find(mapped_item_id))
                        .set((
                            items::box_id.eq(mapped_box_id),
                            items::name.eq(&item.name),
                            items::description.eq(&item.description),
                            items::photo_url.eq(&item.photo_url),
                            items::physical_location.eq(&item.physical_location),
                            items::tags.eq(strings_to_json(&item.tags)),
                            items::aliases.eq(strings_to_json(&item.aliases)),
                            items::version.eq(item.version),
                            items::deleted_at.eq(item.deleted_at),
                        ))
                        .execute(conn)?;
                } else {
                    diesel::insert_into(items::table)
                        .values((
                            items::id.eq(mapped_item_id),
                            items::warehouse_id.eq(warehouse_id),
                            items::box_id.eq(mapped_box_id),
                            items::name.eq(&item.name),
                            items::description.eq(&item.description),
                            items::photo_url.eq(&item.photo_url),
                            items::physical_location.eq(&item.physical_location),
                            items::tags.eq(strings_to_json(&item.tags)),
                            items::aliases.eq(strings_to_json(&item.aliases)),
                            items::version.eq(item.version),
                            items::deleted_at.eq(item.deleted_at),
                        ))
                        .execute(conn)?;
                }

                append_change_log(
                    conn,
                    warehouse_id,
                    "item",
                    "import",
                    Some(mapped_item_id),
                    Some(item.version),
                    Some(json!({"name": item.name, "box_id": mapped_box_id})),
                )?;
                items_upserted += 1;
            }

            let mut stock_movements_upserted = 0usize;
            for movement in &payload.stock_movements {
                let mapped_item_id = *item_id_map.get(&movement.item_id).unwrap_or(&movement.item_id);

                let already: Option<Uuid> = stock_movements::table
                    .filter(stock_movements::item_id.eq(mapped_item_id))
                    .filter(stock_movements::command_id.eq(&movement.command_id))
                    .select(stock_movements::id)
                    .first(conn)
                    .optional()?;
                if already.is_some() {
                    continue;
                }

                let item_owner = existing_item_owner(conn, mapped_item_id)?;
                if item_owner != Some(warehouse_id) {
                    return Err(WarehouseError::InvalidInput(format!(
                        "item {mapped_item_id} not found for stock movement {}",
                        movement.id
                    )));
                }

                let owner = existing_movement_owner(conn, movement.id)?;
                let mapped_movement_id = match owner {
                    Some(owner_id) if owner_id != warehouse_id => Uuid::new_v4(),
                    _ => movement.id,
                };

                diesel::insert_into(stock_movements::table)
                    .values((
                        stock_movements::id.eq(mapped_movement_id),
                        stock_movements::warehouse_id.eq(warehouse_id),
                        stock_movements::item_id.eq(mapped_item_id),
                        stock_movements::delta.eq(movement.delta),
                        stock_movements::command_id.eq(&movement.command_id),
                        stock_movements::note.eq(&movement.note),
                    ))
                    .execute(conn)?;

                append_change_log(
                    conn,
                    warehouse_id,
                    "stock",
                    "import",
                    Some(mapped_item_id),
                    None,
                    Some(json!({"delta": movement.delta, "command_id": movement.command_id})),
                )?;
                stock_movements_upserted += 1;
            }

            append_change_log(
                conn,
                warehouse_id,
                "warehouse",
                "import",
                Some(warehouse_id),
                None,
                Some(json!({"updated_by": current_user.id})),
            )?;

            Ok((boxes_upserted, items_upserted, stock_movements_upserted))
        })?;

    Ok(Json(WarehouseImportResponse {
        message: "Import completed".to_string(),
        boxes_upserted,
        items_upserted,
        stock_movements_upserted,
    }))
}
