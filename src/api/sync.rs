// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0
//
// Push/pull/resolve sync engine (SPEC_FULL.md §4.5). One request is one transaction:
// every command in a push either lands together or the whole batch rolls back on a
// hard error: a per-command conflict is not a hard error, it is recorded and skipped.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::{WarehouseError, WarehouseResult};
use crate::extractors::{require_membership, CurrentUser};
use crate::models::box_record::{BoxRecord, NewBoxRecord};
use crate::models::change_log::ChangeLogEntryResponse;
use crate::models::item::{strings_to_json, Item, ItemFavorite, NewItem, NewItemFavorite};
use crate::models::processed_command::{NewProcessedCommand, ProcessedCommand};
use crate::models::stock_movement::{NewStockMovement, StockMovement};
use crate::models::sync_conflict::{
    NewSyncConflict, SyncConflict, SyncConflictResponse, CONFLICT_STATUS_OPEN, CONFLICT_STATUS_RESOLVED,
};
use crate::schema::{boxes, change_log, item_favorites, items, processed_commands, stock_movements, sync_conflicts};
use crate::services::sync_log::append_change_log;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sync/push", post(push_commands))
        .route("/sync/pull", get(pull_changes))
        .route("/sync/resolve", post(resolve_conflict))
}

const PULL_PAGE_SIZE: i64 = 500;

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

fn find_box(conn: &mut PgConnection, warehouse_id: Uuid, box_id: Uuid) -> WarehouseResult<Option<BoxRecord>> {
    Ok(boxes::table
        .find(box_id)
        .filter(boxes::warehouse_id.eq(warehouse_id))
        .first(conn)
        .optional()?)
}

fn find_item(conn: &mut PgConnection, warehouse_id: Uuid, item_id: Uuid) -> WarehouseResult<Option<Item>> {
    Ok(items::table
        .find(item_id)
        .filter(items::warehouse_id.eq(warehouse_id))
        .first(conn)
        .optional()?)
}

#[derive(Deserialize, Clone, Debug)]
struct SyncCommandRequest {
    command_id: String,
    #[serde(rename = "type")]
    command_type: String,
    entity_id: Option<Uuid>,
    base_version: Option<i32>,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
struct PushRequest {
    warehouse_id: Uuid,
    #[serde(default)]
    device_id: String,
    commands: Vec<SyncCommandRequest>,
}

#[derive(Serialize)]
struct PushResponse {
    applied_command_ids: Vec<String>,
    skipped_command_ids: Vec<String>,
    conflicts: Vec<SyncConflictResponse>,
    last_seq: i64,
}

fn create_or_get_conflict(
    conn: &mut PgConnection,
    warehouse_id: Uuid,
    command: &SyncCommandRequest,
    entity_type: &str,
    entity_id: Uuid,
    server_version: Option<i32>,
    created_by: Uuid,
) -> WarehouseResult<SyncConflict> {
    let existing: Option<SyncConflict> = sync_conflicts::table
        .filter(sync_conflicts::warehouse_id.eq(warehouse_id))
        .filter(sync_conflicts::command_id.eq(&command.command_id))
        .first(conn)
        .optional()?;
    if let Some(existing) = existing {
        return Ok(existing);
    }
    let row = NewSyncConflict {
        id: Uuid::new_v4(),
        warehouse_id,
        command_id: command.command_id.clone(),
        entity_type: entity_type.to_string(),
        entity_id,
        base_version: command.base_version,
        server_version,
        client_payload_json: command.payload.clone(),
        created_by,
    };
    Ok(diesel::insert_into(sync_conflicts::table).values(&row).get_result(conn)?)
}

fn check_version_conflict(
    conn: &mut PgConnection,
    warehouse_id: Uuid,
    command: &SyncCommandRequest,
    entity_type: &str,
    entity_id: Uuid,
    server_version: i32,
    created_by: Uuid,
) -> WarehouseResult<Option<SyncConflict>> {
    match command.base_version {
        None => Ok(None),
        Some(base) if base == server_version => Ok(None),
        Some(_) => Ok(Some(create_or_get_conflict(
            conn,
            warehouse_id,
            command,
            entity_type,
            entity_id,
            Some(server_version),
            created_by,
        )?)),
    }
}

fn payload_str(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn payload_uuid(payload: &Value, key: &str) -> Option<Uuid> {
    payload.get(key).and_then(|v| v.as_str()).and_then(|s| s.parse().ok())
}

fn payload_strings(payload: &Value, key: &str) -> Option<Vec<String>> {
    payload.get(key).and_then(|v| v.as_array()).map(|arr| {
        arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()
    })
}

#[allow(clippy::too_many_lines)]
fn apply_sync_command(
    conn: &mut PgConnection,
    warehouse_id: Uuid,
    user_id: Uuid,
    command: &SyncCommandRequest,
) -> WarehouseResult<Option<SyncConflict>> {
    match command.command_type.as_str() {
        "box.create" => {
            if let Some(parent_id) = payload_uuid(&command.payload, "parent_box_id") {
                find_box(conn, warehouse_id, parent_id)?
                    .ok_or_else(|| WarehouseError::InvalidInput(format!("parent box {parent_id} not found")))?;
            }
            let box_id = command
                .entity_id
                .or_else(|| payload_uuid(&command.payload, "id"))
                .unwrap_or_else(Uuid::new_v4);

            if find_box(conn, warehouse_id, box_id)?.is_none() {
                let new_box = NewBoxRecord {
                    id: box_id,
                    warehouse_id,
                    parent_box_id: payload_uuid(&command.payload, "parent_box_id"),
                    name: payload_str(&command.payload, "name").unwrap_or_else(|| "Caja Sync".to_string()),
                    description: payload_str(&command.payload, "description"),
                    physical_location: payload_str(&command.payload, "physical_location"),
                    qr_token: payload_str(&command.payload, "qr_token").unwrap_or_else(new_qr_token),
                    short_code: payload_str(&command.payload, "short_code").unwrap_or_else(new_short_code),
                };
                diesel::insert_into(boxes::table).values(&new_box).execute(conn)?;
            }
            append_change_log(
                conn,
                warehouse_id,
                "box",
                "create",
                Some(box_id),
                Some(1),
                Some(json!({"name": payload_str(&command.payload, "name")})),
            )?;
            Ok(None)
        }
        "box.update" | "box.move" | "box.delete" | "box.restore" => {
            let box_id = command
                .entity_id
                .ok_or_else(|| WarehouseError::InvalidInput("entity_id is required".to_string()))?;
            let mut record = find_box(conn, warehouse_id, box_id)?
                .ok_or_else(|| WarehouseError::NotFound(format!("box {box_id} not found")))?;

            if let Some(conflict) =
                check_version_conflict(conn, warehouse_id, command, "box", box_id, record.version, user_id)?
            {
                return Ok(Some(conflict));
            }

            match command.command_type.as_str() {
                "box.update" => {
                    let mut changed = false;
                    if let Some(name) = payload_str(&command.payload, "name") {
                        record.name = name;
                        changed = true;
                    }
                    if command.payload.get("description").is_some() {
                        record.description = payload_str(&command.payload, "description");
                        changed = true;
                    }
                    if command.payload.get("physical_location").is_some() {
                        record.physical_location = payload_str(&command.payload, "physical_location");
                        changed = true;
                    }
                    if changed {
                        record.version += 1;
                        diesel::update(boxes::table.find(box_id)).set(&record).execute(conn)?;
                    }
                }
                "box.move" => {
                    let new_parent = payload_uuid(&command.payload, "new_parent_box_id");
                    if let Some(new_parent_id) = new_parent {
                        find_box(conn, warehouse_id, new_parent_id)?
                            .ok_or_else(|| WarehouseError::InvalidInput(format!("parent box {new_parent_id} not found")))?;
                    }
                    record.parent_box_id = new_parent;
                    record.version += 1;
                    diesel::update(boxes::table.find(box_id)).set(&record).execute(conn)?;
                }
                "box.delete" => {
                    if record.is_live() {
                        record.deleted_at = Some(Utc::now());
                        record.version += 1;
                        diesel::update(boxes::table.find(box_id)).set(&record).execute(conn)?;
                    }
                }
                "box.restore" => {
                    if record.deleted_at.is_some() {
                        record.deleted_at = None;
                        record.version += 1;
                        diesel::update(boxes::table.find(box_id)).set(&record).execute(conn)?;
                    }
                }
                _ => unreachable!(),
            }

            let action = command.command_type.strip_prefix("box.").unwrap_or("update");
            append_change_log(conn, warehouse_id, "box", action, Some(box_id), Some(record.version), None)?;
            Ok(None)
        }
        "item.create" => {
            let box_id = payload_uuid(&command.payload, "box_id")
                .ok_or_else(|| WarehouseError::InvalidInput("box_id is required".to_string()))?;
            let target_box = find_box(conn, warehouse_id, box_id)?
                .ok_or_else(|| WarehouseError::InvalidInput(format!("box {box_id} not found")))?;
            if !target_box.is_live() {
                return Err(WarehouseError::InvalidInput(format!("box {box_id} is deleted")));
            }

            let item_id = command
                .entity_id
                .or_else(|| payload_uuid(&command.payload, "id"))
                .unwrap_or_else(Uuid::new_v4);

            if find_item(conn, warehouse_id, item_id)?.is_none() {
                let new_item = NewItem {
                    id: item_id,
                    warehouse_id,
                    box_id,
                    name: payload_str(&command.payload, "name").unwrap_or_else(|| "Item Sync".to_string()),
                    description: payload_str(&command.payload, "description"),
                    photo_url: payload_str(&command.payload, "photo_url"),
                    physical_location: payload_str(&command.payload, "physical_location"),
                    tags: strings_to_json(&payload_strings(&command.payload, "tags").unwrap_or_default()),
                    aliases: strings_to_json(&payload_strings(&command.payload, "aliases").unwrap_or_default()),
                };
                diesel::insert_into(items::table).values(&new_item).execute(conn)?;
            }
            append_change_log(
                conn,
                warehouse_id,
                "item",
                "create",
                Some(item_id),
                Some(1),
                Some(json!({"name": payload_str(&command.payload, "name")})),
            )?;
            Ok(None)
        }
        "item.update" | "item.delete" | "item.restore" => {
            let item_id = command
                .entity_id
                .ok_or_else(|| WarehouseError::InvalidInput("entity_id is required".to_string()))?;
            let mut record = find_item(conn, warehouse_id, item_id)?
                .ok_or_else(|| WarehouseError::NotFound(format!("item {item_id} not found")))?;

            if let Some(conflict) =
                check_version_conflict(conn, warehouse_id, command, "item", item_id, record.version, user_id)?
            {
                return Ok(Some(conflict));
            }

            match command.command_type.as_str() {
                "item.update" => {
                    let mut changed = false;
                    if let Some(box_id) = payload_uuid(&command.payload, "box_id") {
                        let target_box = find_box(conn, warehouse_id, box_id)?
                            .ok_or_else(|| WarehouseError::InvalidInput(format!("box {box_id} not found")))?;
                        if !target_box.is_live() {
                            return Err(WarehouseError::InvalidInput(format!("box {box_id} is deleted")));
                        }
                        record.box_id = box_id;
                        changed = true;
                    }
                    if let Some(name) = payload_str(&command.payload, "name") {
                        record.name = name;
                        changed = true;
                    }
                    if command.payload.get("description").is_some() {
                        record.description = payload_str(&command.payload, "description");
                        changed = true;
                    }
                    if command.payload.get("photo_url").is_some() {
                        record.photo_url = payload_str(&command.payload, "photo_url");
                        changed = true;
                    }
                    if command.payload.get("physical_location").is_some() {
                        record.physical_location = payload_str(&command.payload, "physical_location");
                        changed = true;
                    }
                    if let Some(tags) = payload_strings(&command.payload, "tags") {
                        record.tags = strings_to_json(&tags);
                        changed = true;
                    }
                    if let Some(aliases) = payload_strings(&command.payload, "aliases") {
                        record.aliases = strings_to_json(&aliases);
                        changed = true;
                    }
                    if changed {
                        record.version += 1;
                        diesel::update(items::table.find(item_id)).set(&record).execute(conn)?;
                    }
                }
                "item.delete" => {
                    if record.is_live() {
                        record.deleted_at = Some(Utc::now());
                        record.version += 1;
                        diesel::update(items::table.find(item_id)).set(&record).execute(conn)?;
                    }
                }
                "item.restore" => {
                    if record.deleted_at.is_some() {
                        let target_box = find_box(conn, warehouse_id, record.box_id)?
                            .ok_or_else(|| WarehouseError::InvalidInput("box not found".to_string()))?;
                        if !target_box.is_live() {
                            return Err(WarehouseError::InvalidInput("cannot restore item into a deleted box".to_string()));
                        }
                        record.deleted_at = None;
                        record.version += 1;
                        diesel::update(items::table.find(item_id)).set(&record).execute(conn)?;
                    }
                }
                _ => unreachable!(),
            }

            let action = command.command_type.strip_prefix("item.").unwrap_or("update");
            append_change_log(conn, warehouse_id, "item", action, Some(item_id), Some(record.version), None)?;
            Ok(None)
        }
        "item.favorite" | "item.unfavorite" => {
            let item_id = command
                .entity_id
                .ok_or_else(|| WarehouseError::InvalidInput("entity_id is required".to_string()))?;
            find_item(conn, warehouse_id, item_id)?
                .ok_or_else(|| WarehouseError::NotFound(format!("item {item_id} not found")))?;

            let is_favorite = command.command_type == "item.favorite";
            let existing: Option<ItemFavorite> =
                item_favorites::table.find((user_id, item_id)).first(conn).optional()?;
            match (is_favorite, existing) {
                (true, None) => {
                    diesel::insert_into(item_favorites::table)
                        .values(&NewItemFavorite { user_id, item_id })
                        .execute(conn)?;
                }
                (false, Some(_)) => {
                    diesel::delete(item_favorites::table.find((user_id, item_id))).execute(conn)?;
                }
                _ => {}
            }

            append_change_log(
                conn,
                warehouse_id,
                "favorite",
                "set",
                Some(item_id),
                None,
                Some(json!({"user_id": user_id, "is_favorite": is_favorite})),
            )?;
            Ok(None)
        }
        "stock.adjust" => {
            let item_id = command
                .entity_id
                .ok_or_else(|| WarehouseError::InvalidInput("entity_id is required".to_string()))?;
            let item = find_item(conn, warehouse_id, item_id)?
                .ok_or_else(|| WarehouseError::NotFound(format!("item {item_id} not found")))?;
            if !item.is_live() {
                return Err(WarehouseError::NotFound(format!("item {item_id} not found")));
            }
            let delta = command
                .payload
                .get("delta")
                .and_then(|v| v.as_i64())
                .ok_or_else(|| WarehouseError::InvalidInput("delta is required".to_string()))? as i32;
            if delta != 1 && delta != -1 {
                return Err(WarehouseError::InvalidInput("delta must be 1 or -1".to_string()));
            }

            let existing: Option<StockMovement> = stock_movements::table
                .filter(stock_movements::item_id.eq(item_id))
                .filter(stock_movements::command_id.eq(&command.command_id))
                .first(conn)
                .optional()?;
            if existing.is_none() {
                let row = NewStockMovement {
                    id: Uuid::new_v4(),
                    warehouse_id,
                    item_id,
                    delta,
                    command_id: command.command_id.clone(),
                    note: payload_str(&command.payload, "note"),
                };
                diesel::insert_into(stock_movements::table).values(&row).execute(conn)?;
                append_change_log(
                    conn,
                    warehouse_id,
                    "stock",
                    "adjust",
                    Some(item_id),
                    None,
                    Some(json!({"delta": delta, "command_id": command.command_id})),
                )?;
            }
            Ok(None)
        }
        other => Err(WarehouseError::InvalidInput(format!("unsupported command type: {other}"))),
    }
}

fn last_seq(conn: &mut PgConnection, warehouse_id: Uuid) -> WarehouseResult<i64> {
    let max: Option<i64> = change_log::table
        .filter(change_log::warehouse_id.eq(warehouse_id))
        .select(diesel::dsl::max(change_log::seq))
        .first(conn)?;
    Ok(max.unwrap_or(0))
}

async fn push_commands(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<PushRequest>,
) -> WarehouseResult<Json<PushResponse>> {
    let mut conn = state.conn()?;
    let warehouse_id = payload.warehouse_id;
    require_membership(&mut conn, user.id, warehouse_id)?;

    let (applied, skipped, conflicts) = conn.build_transaction().read_write().run(
        |conn| -> WarehouseResult<(Vec<String>, Vec<String>, Vec<SyncConflictResponse>)> {
            let mut applied = Vec::new();
            let mut skipped = Vec::new();
            let mut conflicts = Vec::new();
            let mut seen_in_request: std::collections::HashSet<String> = Default::default();

            for command in &payload.commands {
                if !seen_in_request.insert(command.command_id.clone()) {
                    skipped.push(command.command_id.clone());
                    continue;
                }

                let already_processed: Option<ProcessedCommand> = processed_commands::table
                    .find(&command.command_id)
                    .first(conn)
                    .optional()?;
                if already_processed.is_some() {
                    skipped.push(command.command_id.clone());
                    continue;
                }

                let existing_conflict: Option<SyncConflict> = sync_conflicts::table
                    .filter(sync_conflicts::warehouse_id.eq(warehouse_id))
                    .filter(sync_conflicts::command_id.eq(&command.command_id))
                    .first(conn)
                    .optional()?;
                if let Some(existing_conflict) = existing_conflict {
                    conflicts.push(SyncConflictResponse::from(&existing_conflict));
                    skipped.push(command.command_id.clone());
                    continue;
                }

                match apply_sync_command(conn, warehouse_id, user.id, command)? {
                    Some(conflict) => {
                        conflicts.push(SyncConflictResponse::from(&conflict));
                        skipped.push(command.command_id.clone());
                    }
                    None => {
                        diesel::insert_into(processed_commands::table)
                            .values(&NewProcessedCommand {
                                command_id: command.command_id.clone(),
                                warehouse_id,
                                user_id: user.id,
                                device_id: payload.device_id.clone(),
                                result_hash: None,
                            })
                            .execute(conn)?;
                        applied.push(command.command_id.clone());
                    }
                }
            }

            Ok((applied, skipped, conflicts))
        },
    )?;

    state
        .metrics
        .sync_push_commands_total
        .with_label_values(&["applied"])
        .inc_by(applied.len() as u64);
    state
        .metrics
        .sync_push_commands_total
        .with_label_values(&["skipped"])
        .inc_by(skipped.len() as u64);
    for conflict in &conflicts {
        state
            .metrics
            .sync_conflicts_total
            .with_label_values(&[&conflict.entity_type])
            .inc();
    }

    let seq = last_seq(&mut conn, warehouse_id)?;
    Ok(Json(PushResponse {
        applied_command_ids: applied,
        skipped_command_ids: skipped,
        conflicts,
        last_seq: seq,
    }))
}

#[derive(Deserialize)]
struct PullQuery {
    warehouse_id: Uuid,
    #[serde(default)]
    since_seq: i64,
}

#[derive(Serialize)]
struct PullResponse {
    changes: Vec<ChangeLogEntryResponse>,
    conflicts: Vec<SyncConflictResponse>,
    last_seq: i64,
}

async fn pull_changes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PullQuery>,
) -> WarehouseResult<Json<PullResponse>> {
    let mut conn = state.conn()?;
    let warehouse_id = query.warehouse_id;
    require_membership(&mut conn, user.id, warehouse_id)?;

    let changes: Vec<crate::models::change_log::ChangeLogEntry> = change_log::table
        .filter(change_log::warehouse_id.eq(warehouse_id))
        .filter(change_log::seq.gt(query.since_seq))
        .order(change_log::seq.asc())
        .limit(PULL_PAGE_SIZE)
        .load(&mut conn)?;

    let open_conflicts: Vec<SyncConflict> = sync_conflicts::table
        .filter(sync_conflicts::warehouse_id.eq(warehouse_id))
        .filter(sync_conflicts::status.eq(CONFLICT_STATUS_OPEN))
        .order(sync_conflicts::created_at.asc())
        .load(&mut conn)?;

    let seq = last_seq(&mut conn, warehouse_id)?;
    Ok(Json(PullResponse {
        changes: changes.iter().map(ChangeLogEntryResponse::from).collect(),
        conflicts: open_conflicts.iter().map(SyncConflictResponse::from).collect(),
        last_seq: seq,
    }))
}

#[derive(Deserialize)]
struct ResolveRequest {
    warehouse_id: Uuid,
    conflict_id: Uuid,
    resolution: String,
    #[serde(default)]
    payload: Value,
}

async fn resolve_conflict(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ResolveRequest>,
) -> WarehouseResult<Json<SyncConflictResponse>> {
    let mut conn = state.conn()?;
    let warehouse_id = payload.warehouse_id;
    let conflict_id = payload.conflict_id;
    require_membership(&mut conn, user.id, warehouse_id)?;

    let mut conflict: SyncConflict = sync_conflicts::table
        .find(conflict_id)
        .filter(sync_conflicts::warehouse_id.eq(warehouse_id))
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| WarehouseError::NotFound("conflict not found".to_string()))?;

    if !conflict.is_open() {
        return Ok(Json(SyncConflictResponse::from(&conflict)));
    }

    if payload.resolution == "keep_server" {
        conflict.status = CONFLICT_STATUS_RESOLVED.to_string();
        conflict.resolved_at = Some(Utc::now());
        conflict.resolved_by = Some(user.id);
        conflict = diesel::update(sync_conflicts::table.find(conflict_id)).set(&conflict).get_result(&mut conn)?;
        return Ok(Json(SyncConflictResponse::from(&conflict)));
    }

    if payload.resolution != "keep_client" && payload.resolution != "merge" {
        return Err(WarehouseError::InvalidInput(format!(
            "unsupported resolution: {}",
            payload.resolution
        )));
    }

    // keep_client always applies the conflict's stored client_payload; merge uses the
    // caller-supplied payload, falling back to client_payload when none was given (per
    // the open-question decision in SPEC_FULL.md §9 — merge with an absent payload
    // behaves like keep_client rather than silently clearing every field).
    let source_payload = if payload.resolution == "keep_client" {
        conflict.client_payload_json.clone()
    } else if payload.payload.as_object().map(|o| o.is_empty()).unwrap_or(true) {
        conflict.client_payload_json.clone()
    } else {
        payload.payload.clone()
    };

    let conflict = conn.build_transaction().read_write().run(|conn| -> WarehouseResult<SyncConflict> {
        match conflict.entity_type.as_str() {
            "box" => {
                let mut record = boxes::table
                    .find(conflict.entity_id)
                    .filter(boxes::warehouse_id.eq(warehouse_id))
                    .first::<BoxRecord>(conn)
                    .optional()?
                    .ok_or_else(|| WarehouseError::NotFound("box not found".to_string()))?;
                if let Some(name) = payload_str(&source_payload, "name") {
                    record.name = name;
                }
                if source_payload.get("description").is_some() {
                    record.description = payload_str(&source_payload, "description");
                }
                if source_payload.get("physical_location").is_some() {
                    record.physical_location = payload_str(&source_payload, "physical_location");
                }
                if let Some(new_parent) = payload_uuid(&source_payload, "new_parent_box_id") {
                    find_box(conn, warehouse_id, new_parent)?
                        .ok_or_else(|| WarehouseError::InvalidInput("parent box not found".to_string()))?;
                    record.parent_box_id = Some(new_parent);
                }
                record.version += 1;
                diesel::update(boxes::table.find(conflict.entity_id)).set(&record).execute(conn)?;
                append_change_log(
                    conn,
                    warehouse_id,
                    "box",
                    "resolve",
                    Some(conflict.entity_id),
                    Some(record.version),
                    None,
                )?;
            }
            "item" => {
                let mut record = items::table
                    .find(conflict.entity_id)
                    .filter(items::warehouse_id.eq(warehouse_id))
                    .first::<Item>(conn)
                    .optional()?
                    .ok_or_else(|| WarehouseError::NotFound("item not found".to_string()))?;
                if let Some(box_id) = payload_uuid(&source_payload, "box_id") {
                    find_box(conn, warehouse_id, box_id)?
                        .ok_or_else(|| WarehouseError::InvalidInput("box not found".to_string()))?;
                    record.box_id = box_id;
                }
                if let Some(name) = payload_str(&source_payload, "name") {
                    record.name = name;
                }
                if source_payload.get("description").is_some() {
                    record.description = payload_str(&source_payload, "description");
                }
                if source_payload.get("photo_url").is_some() {
                    record.photo_url = payload_str(&source_payload, "photo_url");
                }
                if source_payload.get("physical_location").is_some() {
                    record.physical_location = payload_str(&source_payload, "physical_location");
                }
                if let Some(tags) = payload_strings(&source_payload, "tags") {
                    record.tags = strings_to_json(&tags);
                }
                if let Some(aliases) = payload_strings(&source_payload, "aliases") {
                    record.aliases = strings_to_json(&aliases);
                }
                record.version += 1;
                diesel::update(items::table.find(conflict.entity_id)).set(&record).execute(conn)?;
                append_change_log(
                    conn,
                    warehouse_id,
                    "item",
                    "resolve",
                    Some(conflict.entity_id),
                    Some(record.version),
                    None,
                )?;
            }
            other => {
                return Err(WarehouseError::InvalidInput(format!("unsupported conflict entity type: {other}")));
            }
        }

        conflict.status = CONFLICT_STATUS_RESOLVED.to_string();
        conflict.resolved_at = Some(Utc::now());
        conflict.resolved_by = Some(user.id);
        let conflict = diesel::update(sync_conflicts::table.find(conflict_id)).set(&conflict).get_result(conn)?;
        Ok(conflict)
    })?;

    Ok(Json(SyncConflictResponse::from(&conflict)))
}
