// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::processed_commands;

#[derive(Queryable, Identifiable, Clone, Debug)]
#[diesel(table_name = processed_commands, primary_key(command_id))]
pub struct ProcessedCommand {
    pub command_id: String,
    pub warehouse_id: Uuid,
    pub user_id: Uuid,
    pub device_id: String,
    pub processed_at: DateTime<Utc>,
    pub result_hash: Option<String>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = processed_commands)]
pub struct NewProcessedCommand {
    pub command_id: String,
    pub warehouse_id: Uuid,
    pub user_id: Uuid,
    pub device_id: String,
    pub result_hash: Option<String>,
}
