// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::WarehouseError;
use crate::models::activity_event::NewActivityEvent;
use crate::schema::activity_events;

#[allow(clippy::too_many_arguments)]
pub fn record_activity(
    conn: &mut PgConnection,
    warehouse_id: Uuid,
    actor_user_id: Uuid,
    event_type: &str,
    entity_type: Option<&str>,
    entity_id: Option<Uuid>,
    metadata: Option<Value>,
) -> Result<(), WarehouseError> {
    let row = NewActivityEvent {
        id: Uuid::new_v4(),
        warehouse_id,
        actor_user_id,
        event_type: event_type.to_string(),
        entity_type: entity_type.map(str::to_string),
        entity_id,
        metadata_json: metadata.unwrap_or_else(|| Value::Object(Default::default())),
    };
    diesel::insert_into(activity_events::table)
        .values(&row)
        .execute(conn)?;
    Ok(())
}
