// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::schema::activity_events;

#[derive(Queryable, Identifiable, Clone, Debug)]
#[diesel(table_name = activity_events)]
pub struct ActivityEvent {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub actor_user_id: Uuid,
    pub event_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub metadata_json: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = activity_events)]
pub struct NewActivityEvent {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub actor_user_id: Uuid,
    pub event_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub metadata_json: Value,
}
