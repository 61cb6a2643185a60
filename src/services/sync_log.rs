// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::WarehouseError;
use crate::models::change_log::{ChangeLogEntry, NewChangeLogEntry};
use crate::schema::change_log;

/// Appends one entry to the per-warehouse change feed (SPEC_FULL.md §4.4). Must be called
/// inside the same transaction as the mutation it records.
pub fn append_change_log(
    conn: &mut PgConnection,
    warehouse_id: Uuid,
    entity_type: &str,
    action: &str,
    entity_id: Option<Uuid>,
    entity_version: Option<i32>,
    payload: Option<Value>,
) -> Result<ChangeLogEntry, WarehouseError> {
    let row = NewChangeLogEntry {
        warehouse_id,
        entity_type: entity_type.to_string(),
        entity_id,
        action: action.to_string(),
        entity_version,
        payload_json: payload.unwrap_or_else(|| Value::Object(Default::default())),
    };
    diesel::insert_into(change_log::table)
        .values(&row)
        .get_result(conn)
        .map_err(WarehouseError::from)
}
