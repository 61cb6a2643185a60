// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::schema::change_log;

#[derive(Queryable, Identifiable, Clone, Debug)]
#[diesel(table_name = change_log, primary_key(seq))]
pub struct ChangeLogEntry {
    pub seq: i64,
    pub warehouse_id: Uuid,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub action: String,
    pub entity_version: Option<i32>,
    pub payload_json: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = change_log)]
pub struct NewChangeLogEntry {
    pub warehouse_id: Uuid,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub action: String,
    pub entity_version: Option<i32>,
    pub payload_json: Value,
}

#[derive(Serialize, Debug, Clone)]
pub struct ChangeLogEntryResponse {
    pub seq: i64,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub action: String,
    pub entity_version: Option<i32>,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl From<&ChangeLogEntry> for ChangeLogEntryResponse {
    fn from(e: &ChangeLogEntry) -> Self {
        ChangeLogEntryResponse {
            seq: e.seq,
            entity_type: e.entity_type.clone(),
            entity_id: e.entity_id,
            action: e.action.clone(),
            entity_version: e.entity_version,
            payload: e.payload_json.clone(),
            created_at: e.created_at,
        }
    }
}
