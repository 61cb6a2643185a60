// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use std::collections::{HashMap, HashSet};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{WarehouseError, WarehouseResult};
use crate::extractors::{CurrentUser, WarehouseMembership};
use crate::models::box_record::{BoxRecord, BoxResponse, BoxTreeNode, NewBoxRecord};
use crate::models::item::Item;
use crate::models::stock_movement::StockMovement;
use crate::schema::{boxes, items, stock_movements};
use crate::services::activity::record_activity;
use crate::services::sync_log::append_change_log;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/warehouses/:warehouse_id/boxes/tree", get(get_tree))
        .route("/warehouses/:warehouse_id/boxes", post(create_box))
        .route(
            "/warehouses/:warehouse_id/boxes/:box_id",
            get(get_box_handler).patch(update_box).delete(delete_box),
        )
        .route("/warehouses/:warehouse_id/boxes/:box_id/items", get(get_box_items_recursive))
        .route("/warehouses/:warehouse_id/boxes/:box_id/move", post(move_box))
        .route("/warehouses/:warehouse_id/boxes/:box_id/restore", post(restore_box))
        .route("/boxes/by-qr/:qr_token", get(get_box_by_qr))
}

fn get_box(
    conn: &mut PgConnection,
    warehouse_id: Uuid,
    box_id: Uuid,
    include_deleted: bool,
) -> WarehouseResult<BoxRecord> {
    let mut query = boxes::table
        .find(box_id)
        .filter(boxes::warehouse_id.eq(warehouse_id))
        .into_boxed();
    if !include_deleted {
        query = query.filter(boxes::deleted_at.is_null());
    }
    query
        .first(conn)
        .optional()?
        .ok_or_else(|| WarehouseError::NotFound("box not found".to_string()))
}

fn build_box_maps(
    conn: &mut PgConnection,
    warehouse_id: Uuid,
    include_deleted: bool,
) -> WarehouseResult<(HashMap<Uuid, BoxRecord>, HashMap<Option<Uuid>, Vec<Uuid>>)> {
    let mut query = boxes::table.filter(boxes::warehouse_id.eq(warehouse_id)).into_boxed();
    if !include_deleted {
        query = query.filter(boxes::deleted_at.is_null());
    }
    let rows: Vec<BoxRecord> = query.load(conn)?;
    let mut by_id = HashMap::new();
    let mut children: HashMap<Option<Uuid>, Vec<Uuid>> = HashMap::new();
    for b in rows {
        children.entry(b.parent_box_id).or_default().push(b.id);
        by_id.insert(b.id, b);
    }
    Ok((by_id, children))
}

fn collect_descendant_ids(root_id: Uuid, children: &HashMap<Option<Uuid>, Vec<Uuid>>) -> HashSet<Uuid> {
    let mut stack = vec![root_id];
    let mut descendants = HashSet::new();
    while let Some(current) = stack.pop() {
        if !descendants.insert(current) {
            continue;
        }
        if let Some(kids) = children.get(&Some(current)) {
            stack.extend(kids.iter().copied());
        }
    }
    descendants
}

fn next_default_name(conn: &mut PgConnection, warehouse_id: Uuid) -> WarehouseResult<String> {
    let count: i64 = boxes::table
        .filter(boxes::warehouse_id.eq(warehouse_id))
        .count()
        .get_result(conn)?;
    Ok(format!("Caja {}", count + 1))
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

fn compute_recursive_counts(
    boxes_by_id: &HashMap<Uuid, BoxRecord>,
    children: &HashMap<Option<Uuid>, Vec<Uuid>>,
    warehouse_items: &[Item],
) -> (HashMap<Uuid, i64>, HashMap<Uuid, i64>) {
    let mut direct_items: HashMap<Uuid, i64> = HashMap::new();
    for item in warehouse_items {
        *direct_items.entry(item.box_id).or_insert(0) += 1;
    }

    let mut item_counts: HashMap<Uuid, i64> = HashMap::new();
    let mut box_counts: HashMap<Uuid, i64> = HashMap::new();

    fn walk(
        box_id: Uuid,
        children: &HashMap<Option<Uuid>, Vec<Uuid>>,
        direct_items: &HashMap<Uuid, i64>,
        item_counts: &mut HashMap<Uuid, i64>,
        box_counts: &mut HashMap<Uuid, i64>,
    ) -> (i64, i64) {
        if let (Some(i), Some(b)) = (item_counts.get(&box_id), box_counts.get(&box_id)) {
            return (*i, *b);
        }
        let mut total_items = *direct_items.get(&box_id).unwrap_or(&0);
        let mut total_boxes = 0;
        if let Some(kids) = children.get(&Some(box_id)) {
            for &child_id in kids {
                let (child_items, child_boxes) = walk(child_id, children, direct_items, item_counts, box_counts);
                total_items += child_items;
                total_boxes += 1 + child_boxes;
            }
        }
        item_counts.insert(box_id, total_items);
        box_counts.insert(box_id, total_boxes);
        (total_items, total_boxes)
    }

    for &box_id in boxes_by_id.keys() {
        walk(box_id, children, &direct_items, &mut item_counts, &mut box_counts);
    }
    (item_counts, box_counts)
}

fn stock_map(conn: &mut PgConnection, item_ids: &[Uuid]) -> WarehouseResult<HashMap<Uuid, i64>> {
    if item_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<StockMovement> = stock_movements::table
        .filter(stock_movements::item_id.eq_any(item_ids))
        .load(conn)?;
    let mut totals: HashMap<Uuid, i64> = HashMap::new();
    for row in rows {
        *totals.entry(row.item_id).or_insert(0) += row.delta as i64;
    }
    Ok(totals)
}

fn box_path(boxes_by_id: &HashMap<Uuid, BoxRecord>, box_id: Uuid) -> Vec<String> {
    let mut path = Vec::new();
    let mut cursor = Some(box_id);
    let mut guard = 0;
    while let Some(id) = cursor {
        guard += 1;
        if guard > 128 {
            break;
        }
        let Some(b) = boxes_by_id.get(&id) else { break };
        path.push(b.name.clone());
        cursor = b.parent_box_id;
    }
    path.reverse();
    path
}

fn box_path_ids(boxes_by_id: &HashMap<Uuid, BoxRecord>, box_id: Uuid) -> Vec<Uuid> {
    let mut path = Vec::new();
    let mut cursor = Some(box_id);
    let mut guard = 0;
    while let Some(id) = cursor {
        guard += 1;
        if guard > 128 {
            break;
        }
        let Some(b) = boxes_by_id.get(&id) else { break };
        path.push(b.id);
        cursor = b.parent_box_id;
    }
    path.reverse();
    path
}

#[derive(Deserialize)]
struct TreeQuery {
    #[serde(default)]
    include_deleted: bool,
}

async fn get_tree(
    State(state): State<AppState>,
    _membership: WarehouseMembership,
    Path(warehouse_id): Path<Uuid>,
    Query(query): Query<TreeQuery>,
) -> WarehouseResult<Json<Vec<BoxTreeNode>>> {
    let mut conn = state.conn()?;
    let (boxes_by_id, children) = build_box_maps(&mut conn, warehouse_id, query.include_deleted)?;
    let warehouse_items: Vec<Item> = items::table
        .filter(items::warehouse_id.eq(warehouse_id))
        .filter(items::deleted_at.is_null())
        .load(&mut conn)?;
    let (item_counts, box_counts) = compute_recursive_counts(&boxes_by_id, &children, &warehouse_items);

    let mut ordered_nodes = Vec::new();

    fn visit(
        node_id: Uuid,
        depth: i32,
        boxes_by_id: &HashMap<Uuid, BoxRecord>,
        children: &HashMap<Option<Uuid>, Vec<Uuid>>,
        item_counts: &HashMap<Uuid, i64>,
        box_counts: &HashMap<Uuid, i64>,
        ordered_nodes: &mut Vec<BoxTreeNode>,
    ) {
        let b = &boxes_by_id[&node_id];
        ordered_nodes.push(BoxTreeNode {
            record: BoxResponse::from(b),
            depth,
            total_items_recursive: *item_counts.get(&node_id).unwrap_or(&0),
            total_boxes_recursive: *box_counts.get(&node_id).unwrap_or(&0),
        });
        if let Some(kids) = children.get(&Some(node_id)) {
            let mut sorted_kids = kids.clone();
            sorted_kids.sort_by_key(|id| boxes_by_id[id].name.to_lowercase());
            for child_id in sorted_kids {
                visit(child_id, depth + 1, boxes_by_id, children, item_counts, box_counts, ordered_nodes);
            }
        }
    }

    let mut roots = children.get(&None).cloned().unwrap_or_default();
    roots.sort_by_key(|id| boxes_by_id[id].name.to_lowercase());
    for root_id in roots {
        visit(root_id, 0, &boxes_by_id, &children, &item_counts, &box_counts, &mut ordered_nodes);
    }

    Ok(Json(ordered_nodes))
}

#[derive(Deserialize)]
struct BoxCreateRequest {
    parent_box_id: Option<Uuid>,
    name: Option<String>,
    description: Option<String>,
    physical_location: Option<String>,
}

async fn create_box(
    State(state): State<AppState>,
    _membership: WarehouseMembership,
    CurrentUser(current_user): CurrentUser,
    Path(warehouse_id): Path<Uuid>,
    Json(payload): Json<BoxCreateRequest>,
) -> WarehouseResult<(StatusCode, Json<BoxResponse>)> {
    let mut conn = state.conn()?;
    let record: BoxRecord = conn.build_transaction().read_write().run(|conn| -> WarehouseResult<BoxRecord> {
        if let Some(parent_box_id) = payload.parent_box_id {
            get_box(conn, warehouse_id, parent_box_id, false)?;
        }

        let name = match &payload.name {
            Some(n) if !n.trim().is_empty() => n.trim().to_string(),
            _ => next_default_name(conn, warehouse_id)?,
        };
        let new_box = NewBoxRecord {
            id: Uuid::new_v4(),
            warehouse_id,
            parent_box_id: payload.parent_box_id,
            name,
            description: payload.description.clone(),
            physical_location: payload.physical_location.clone(),
            qr_token: new_qr_token(),
            short_code: new_short_code(),
        };
        let record: BoxRecord = diesel::insert_into(boxes::table).values(&new_box).get_result(conn)?;

        record_activity(
            conn,
            warehouse_id,
            current_user.id,
            "box.created",
            Some("box"),
            Some(record.id),
            Some(serde_json::json!({"name": record.name})),
        )?;
        append_change_log(
            conn,
            warehouse_id,
            "box",
            "create",
            Some(record.id),
            Some(record.version),
            Some(serde_json::json!({"name": record.name})),
        )?;

        Ok(record)
    })?;

    Ok((StatusCode::CREATED, Json(BoxResponse::from(&record))))
}

async fn get_box_handler(
    State(state): State<AppState>,
    _membership: WarehouseMembership,
    Path((warehouse_id, box_id)): Path<(Uuid, Uuid)>,
) -> WarehouseResult<Json<BoxResponse>> {
    let mut conn = state.conn()?;
    let record = get_box(&mut conn, warehouse_id, box_id, false)?;
    Ok(Json(BoxResponse::from(&record)))
}

#[derive(Serialize)]
struct BoxItemResponse {
    id: Uuid,
    box_id: Uuid,
    name: String,
    description: Option<String>,
    physical_location: Option<String>,
    stock: i64,
    box_path: Vec<String>,
    box_path_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
struct BoxItemsQuery {
    q: Option<String>,
}

async fn get_box_items_recursive(
    State(state): State<AppState>,
    _membership: WarehouseMembership,
    Path((warehouse_id, box_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<BoxItemsQuery>,
) -> WarehouseResult<Json<Vec<BoxItemResponse>>> {
    let mut conn = state.conn()?;
    get_box(&mut conn, warehouse_id, box_id, false)?;
    let (boxes_by_id, children) = build_box_maps(&mut conn, warehouse_id, false)?;
    let subtree_ids: Vec<Uuid> = collect_descendant_ids(box_id, &children).into_iter().collect();

    let mut db_query = items::table
        .filter(items::warehouse_id.eq(warehouse_id))
        .filter(items::box_id.eq_any(&subtree_ids))
        .filter(items::deleted_at.is_null())
        .into_boxed();
    if let Some(q) = &query.q {
        let needle = format!("%{}%", q.trim().to_lowercase());
        db_query = db_query.filter(diesel::dsl::sql::<diesel::sql_types::Bool>("lower(name) like ").bind::<diesel::sql_types::Text, _>(needle));
    }
    let mut loaded: Vec<Item> = db_query.load(&mut conn)?;
    loaded.sort_by_key(|i| i.name.clone());
    let stocks = stock_map(&mut conn, &loaded.iter().map(|i| i.id).collect::<Vec<_>>())?;

    Ok(Json(
        loaded
            .into_iter()
            .map(|item| BoxItemResponse {
                id: item.id,
                box_id: item.box_id,
                name: item.name.clone(),
                description: item.description.clone(),
                physical_location: item.physical_location.clone(),
                stock: *stocks.get(&item.id).unwrap_or(&0),
                box_path: box_path(&boxes_by_id, item.box_id),
                box_path_ids: box_path_ids(&boxes_by_id, item.box_id),
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
struct BoxUpdateRequest {
    name: Option<String>,
    description: Option<String>,
    physical_location: Option<String>,
}

async fn update_box(
    State(state): State<AppState>,
    _membership: WarehouseMembership,
    Path((warehouse_id, box_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<BoxUpdateRequest>,
) -> WarehouseResult<Json<BoxResponse>> {
    let mut conn = state.conn()?;
    let record = conn.build_transaction().read_write().run(|conn| -> WarehouseResult<BoxRecord> {
        let mut record = get_box(conn, warehouse_id, box_id, false)?;

        let mut changed = false;
        if let Some(name) = payload.name {
            record.name = name.trim().to_string();
            changed = true;
        }
        if let Some(description) = payload.description {
            record.description = Some(description);
            changed = true;
        }
        if let Some(physical_location) = payload.physical_location {
            record.physical_location = Some(physical_location);
            changed = true;
        }

        if changed {
            record.version += 1;
            record = diesel::update(boxes::table.find(box_id)).set(&record).get_result(conn)?;
            append_change_log(conn, warehouse_id, "box", "update", Some(box_id), Some(record.version), None)?;
        }

        Ok(record)
    })?;

    Ok(Json(BoxResponse::from(&record)))
}

#[derive(Deserialize)]
struct BoxMoveRequest {
    new_parent_box_id: Option<Uuid>,
}

async fn move_box(
    State(state): State<AppState>,
    _membership: WarehouseMembership,
    Path((warehouse_id, box_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<BoxMoveRequest>,
) -> WarehouseResult<Json<BoxResponse>> {
    let mut conn = state.conn()?;
    let record: BoxRecord = conn.build_transaction().read_write().run(|conn| -> WarehouseResult<BoxRecord> {
        let mut record = get_box(conn, warehouse_id, box_id, false)?;

        if payload.new_parent_box_id == Some(box_id) {
            return Err(WarehouseError::InvalidInput("box cannot be parent of itself".to_string()));
        }
        if let Some(new_parent_box_id) = payload.new_parent_box_id {
            get_box(conn, warehouse_id, new_parent_box_id, false)?;
        }

        let (_, children) = build_box_maps(conn, warehouse_id, false)?;
        let descendants = collect_descendant_ids(box_id, &children);
        if let Some(new_parent_box_id) = payload.new_parent_box_id {
            if descendants.contains(&new_parent_box_id) {
                return Err(WarehouseError::InvalidInput("cannot move box into a descendant".to_string()));
            }
        }

        record.parent_box_id = payload.new_parent_box_id;
        record.version += 1;
        let record: BoxRecord = diesel::update(boxes::table.find(box_id)).set(&record).get_result(conn)?;
        append_change_log(conn, warehouse_id, "box", "move", Some(box_id), Some(record.version), None)?;
        Ok(record)
    })?;
    Ok(Json(BoxResponse::from(&record)))
}

#[derive(Deserialize)]
struct BoxDeleteRequest {
    #[serde(default)]
    force: bool,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

async fn delete_box(
    State(state): State<AppState>,
    _membership: WarehouseMembership,
    CurrentUser(current_user): CurrentUser,
    Path((warehouse_id, box_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<BoxDeleteRequest>,
) -> WarehouseResult<Json<MessageResponse>> {
    let mut conn = state.conn()?;
    conn.build_transaction().read_write().run(|conn| -> WarehouseResult<()> {
        get_box(conn, warehouse_id, box_id, false)?;
        let (boxes_by_id, children) = build_box_maps(conn, warehouse_id, false)?;
        let subtree_ids: Vec<Uuid> = collect_descendant_ids(box_id, &children).into_iter().collect();

        let has_children = children.get(&Some(box_id)).is_some_and(|v| !v.is_empty());
        let item_count: i64 = items::table
            .filter(items::warehouse_id.eq(warehouse_id))
            .filter(items::box_id.eq_any(&subtree_ids))
            .filter(items::deleted_at.is_null())
            .count()
            .get_result(conn)?;

        if (has_children || item_count > 0) && !payload.force {
            return Err(WarehouseError::InvalidInput(
                "box has nested content. repeat with force=true to soft-delete recursively".to_string(),
            ));
        }

        let now = Utc::now();
        for sub_box_id in &subtree_ids {
            let sub_box = &boxes_by_id[sub_box_id];
            if sub_box.is_live() {
                let new_version = sub_box.version + 1;
                diesel::update(boxes::table.find(*sub_box_id))
                    .set((boxes::deleted_at.eq(now), boxes::version.eq(new_version)))
                    .execute(conn)?;
                append_change_log(conn, warehouse_id, "box", "delete", Some(*sub_box_id), Some(new_version), None)?;
            }
        }

        let affected_items: Vec<Item> = items::table
            .filter(items::warehouse_id.eq(warehouse_id))
            .filter(items::box_id.eq_any(&subtree_ids))
            .filter(items::deleted_at.is_null())
            .load(conn)?;
        for item in &affected_items {
            let new_version = item.version + 1;
            diesel::update(items::table.find(item.id))
                .set((items::deleted_at.eq(now), items::version.eq(new_version)))
                .execute(conn)?;
            append_change_log(conn, warehouse_id, "item", "delete", Some(item.id), Some(new_version), None)?;
        }

        record_activity(
            conn,
            warehouse_id,
            current_user.id,
            "box.deleted",
            Some("box"),
            Some(box_id),
            Some(serde_json::json!({
                "recursive_boxes": subtree_ids.len(),
                "recursive_items": affected_items.len(),
            })),
        )?;

        Ok(())
    })?;

    Ok(Json(MessageResponse {
        message: "Box moved to trash".to_string(),
    }))
}

async fn restore_box(
    State(state): State<AppState>,
    _membership: WarehouseMembership,
    CurrentUser(current_user): CurrentUser,
    Path((warehouse_id, box_id)): Path<(Uuid, Uuid)>,
) -> WarehouseResult<Json<BoxResponse>> {
    let mut conn = state.conn()?;
    let record: BoxRecord = conn.build_transaction().read_write().run(|conn| -> WarehouseResult<BoxRecord> {
        let mut record = get_box(conn, warehouse_id, box_id, true)?;
        if record.deleted_at.is_none() {
            return Ok(record);
        }

        if let Some(parent_box_id) = record.parent_box_id {
            let parent = get_box(conn, warehouse_id, parent_box_id, true)?;
            if parent.deleted_at.is_some() {
                return Err(WarehouseError::InvalidInput("restore parent box first".to_string()));
            }
        }

        record.deleted_at = None;
        record.version += 1;
        let record: BoxRecord = diesel::update(boxes::table.find(box_id)).set(&record).get_result(conn)?;

        record_activity(
            conn,
            warehouse_id,
            current_user.id,
            "box.restored",
            Some("box"),
            Some(record.id),
            Some(serde_json::json!({"name": record.name})),
        )?;
        append_change_log(conn, warehouse_id, "box", "restore", Some(record.id), Some(record.version), None)?;

        Ok(record)
    })?;

    Ok(Json(BoxResponse::from(&record)))
}

#[derive(Serialize)]
struct BoxByQrResponse {
    box_id: Uuid,
    warehouse_id: Uuid,
    short_code: String,
    name: String,
}

async fn get_box_by_qr(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
    Path(qr_token): Path<String>,
) -> WarehouseResult<Json<BoxByQrResponse>> {
    let mut conn = state.conn()?;
    let record: BoxRecord = boxes::table
        .filter(boxes::qr_token.eq(&qr_token))
        .filter(boxes::deleted_at.is_null())
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| WarehouseError::NotFound("qr not found".to_string()))?;

    let membership: Option<crate::models::warehouse::Membership> = crate::schema::memberships::table
        .find((current_user.id, record.warehouse_id))
        .first(&mut conn)
        .optional()?;
    if membership.is_none() {
        return Err(WarehouseError::Forbidden("no access to warehouse".to_string()));
    }

    Ok(Json(BoxByQrResponse {
        box_id: record.id,
        warehouse_id: record.warehouse_id,
        short_code: record.short_code,
        name: record.name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_box(id: Uuid, parent: Option<Uuid>, name: &str) -> BoxRecord {
        let now = Utc::now();
        BoxRecord {
            id,
            warehouse_id: Uuid::new_v4(),
            parent_box_id: parent,
            name: name.to_string(),
            description: None,
            physical_location: None,
            qr_token: format!("qr-{id}"),
            short_code: format!("BX-{id}"),
            version: 1,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn test_item(id: Uuid, box_id: Uuid) -> Item {
        let now = Utc::now();
        Item {
            id,
            warehouse_id: Uuid::new_v4(),
            box_id,
            name: "widget".to_string(),
            description: None,
            photo_url: None,
            physical_location: None,
            tags: serde_json::json!([]),
            aliases: serde_json::json!([]),
            version: 1,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// root -> mid -> leaf, plus an unrelated sibling of root.
    fn three_level_tree() -> (Uuid, Uuid, Uuid, Uuid, HashMap<Option<Uuid>, Vec<Uuid>>) {
        let root = Uuid::new_v4();
        let mid = Uuid::new_v4();
        let leaf = Uuid::new_v4();
        let sibling = Uuid::new_v4();
        let mut children: HashMap<Option<Uuid>, Vec<Uuid>> = HashMap::new();
        children.insert(None, vec![root, sibling]);
        children.insert(Some(root), vec![mid]);
        children.insert(Some(mid), vec![leaf]);
        (root, mid, leaf, sibling, children)
    }

    #[test]
    fn collect_descendant_ids_includes_root_and_all_levels_but_not_siblings() {
        let (root, mid, leaf, sibling, children) = three_level_tree();
        let descendants = collect_descendant_ids(root, &children);
        assert!(descendants.contains(&root));
        assert!(descendants.contains(&mid));
        assert!(descendants.contains(&leaf));
        assert!(!descendants.contains(&sibling));
        assert_eq!(descendants.len(), 3);
    }

    #[test]
    fn collect_descendant_ids_on_a_leaf_is_just_itself() {
        let (_, _, leaf, _, children) = three_level_tree();
        let descendants = collect_descendant_ids(leaf, &children);
        assert_eq!(descendants.len(), 1);
        assert!(descendants.contains(&leaf));
    }

    #[test]
    fn compute_recursive_counts_sums_items_and_boxes_down_the_tree() {
        let (root, mid, leaf, sibling, children) = three_level_tree();
        let mut boxes_by_id = HashMap::new();
        boxes_by_id.insert(root, test_box(root, None, "root"));
        boxes_by_id.insert(mid, test_box(mid, Some(root), "mid"));
        boxes_by_id.insert(leaf, test_box(leaf, Some(mid), "leaf"));
        boxes_by_id.insert(sibling, test_box(sibling, None, "sibling"));

        let items = vec![test_item(Uuid::new_v4(), leaf), test_item(Uuid::new_v4(), root)];
        let (item_counts, box_counts) = compute_recursive_counts(&boxes_by_id, &children, &items);

        assert_eq!(item_counts[&leaf], 1);
        assert_eq!(item_counts[&mid], 1);
        assert_eq!(item_counts[&root], 2);
        assert_eq!(item_counts[&sibling], 0);

        assert_eq!(box_counts[&leaf], 0);
        assert_eq!(box_counts[&mid], 1);
        assert_eq!(box_counts[&root], 2);
        assert_eq!(box_counts[&sibling], 0);
    }

    #[test]
    fn box_path_walks_from_root_to_leaf_in_order() {
        let (root, mid, leaf, _, _) = three_level_tree();
        let mut boxes_by_id = HashMap::new();
        boxes_by_id.insert(root, test_box(root, None, "root"));
        boxes_by_id.insert(mid, test_box(mid, Some(root), "mid"));
        boxes_by_id.insert(leaf, test_box(leaf, Some(mid), "leaf"));

        assert_eq!(box_path(&boxes_by_id, leaf), vec!["root", "mid", "leaf"]);
        assert_eq!(box_path_ids(&boxes_by_id, leaf), vec![root, mid, leaf]);
    }

    #[test]
    fn box_path_on_an_orphaned_id_stops_gracefully() {
        let boxes_by_id: HashMap<Uuid, BoxRecord> = HashMap::new();
        let missing = Uuid::new_v4();
        assert!(box_path(&boxes_by_id, missing).is_empty());
        assert!(box_path_ids(&boxes_by_id, missing).is_empty());
    }
}
