// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::stock_movements;

#[derive(Queryable, Identifiable, Clone, Debug)]
#[diesel(table_name = stock_movements)]
pub struct StockMovement {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub item_id: Uuid,
    pub delta: i32,
    pub command_id: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = stock_movements)]
pub struct NewStockMovement {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub item_id: Uuid,
    pub delta: i32,
    pub command_id: String,
    pub note: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct StockAdjustResponse {
    pub item_id: Uuid,
    pub stock: i64,
}
