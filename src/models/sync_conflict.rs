// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::schema::sync_conflicts;

pub const CONFLICT_STATUS_OPEN: &str = "open";
pub const CONFLICT_STATUS_RESOLVED: &str = "resolved";

#[derive(Queryable, Identifiable, AsChangeset, Clone, Debug)]
#[diesel(table_name = sync_conflicts)]
pub struct SyncConflict {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub command_id: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub base_version: Option<i32>,
    pub server_version: Option<i32>,
    pub client_payload_json: Value,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
}

impl SyncConflict {
    pub fn is_open(&self) -> bool {
        self.status == CONFLICT_STATUS_OPEN
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = sync_conflicts)]
pub struct NewSyncConflict {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub command_id: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub base_version: Option<i32>,
    pub server_version: Option<i32>,
    pub client_payload_json: Value,
    pub created_by: Uuid,
}

#[derive(Serialize, Debug, Clone)]
pub struct SyncConflictResponse {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub command_id: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub base_version: Option<i32>,
    pub server_version: Option<i32>,
    pub client_payload: Value,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
}

impl From<&SyncConflict> for SyncConflictResponse {
    fn from(c: &SyncConflict) -> Self {
        SyncConflictResponse {
            id: c.id,
            warehouse_id: c.warehouse_id,
            command_id: c.command_id.clone(),
            entity_type: c.entity_type.clone(),
            entity_id: c.entity_id,
            base_version: c.base_version,
            server_version: c.server_version,
            client_payload: c.client_payload_json.clone(),
            status: c.status.clone(),
            created_by: c.created_by,
            created_at: c.created_at,
            resolved_at: c.resolved_at,
            resolved_by: c.resolved_by,
        }
    }
}
