// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::boxes;

/// A node in a warehouse's box forest. Named `BoxRecord` rather than `Box` to avoid
/// shadowing `std::boxed::Box` throughout call sites that also allocate.
#[derive(Queryable, Identifiable, AsChangeset, Clone, Debug)]
#[diesel(table_name = boxes)]
pub struct BoxRecord {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub parent_box_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub physical_location: Option<String>,
    pub qr_token: String,
    pub short_code: String,
    pub version: i32,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BoxRecord {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = boxes)]
pub struct NewBoxRecord {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub parent_box_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub physical_location: Option<String>,
    pub qr_token: String,
    pub short_code: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct BoxResponse {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub parent_box_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub physical_location: Option<String>,
    pub qr_token: String,
    pub short_code: String,
    pub version: i32,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&BoxRecord> for BoxResponse {
    fn from(b: &BoxRecord) -> Self {
        BoxResponse {
            id: b.id,
            warehouse_id: b.warehouse_id,
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

/// A box flattened into a pre-order tree listing (§4.1 "Tree listing").
#[derive(Serialize, Debug, Clone)]
pub struct BoxTreeNode {
    #[serde(flatten)]
    pub record: BoxResponse,
    pub depth: i32,
    pub total_items_recursive: i64,
    pub total_boxes_recursive: i64,
}
