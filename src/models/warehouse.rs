// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{memberships, warehouses};

#[derive(Queryable, Identifiable, Clone, Debug)]
#[diesel(table_name = warehouses)]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = warehouses)]
pub struct NewWarehouse {
    pub id: Uuid,
    pub name: String,
    pub created_by: Uuid,
}

#[derive(Serialize, Debug)]
pub struct WarehouseResponse {
    pub id: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<&Warehouse> for WarehouseResponse {
    fn from(w: &Warehouse) -> Self {
        WarehouseResponse {
            id: w.id,
            name: w.name.clone(),
            created_by: w.created_by,
            created_at: w.created_at,
        }
    }
}

#[derive(Queryable, Identifiable, Clone, Debug)]
#[diesel(table_name = memberships, primary_key(user_id, warehouse_id))]
pub struct Membership {
    pub user_id: Uuid,
    pub warehouse_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = memberships)]
pub struct NewMembership {
    pub user_id: Uuid,
    pub warehouse_id: Uuid,
}

#[derive(Serialize, Debug)]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub warehouse_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<&Membership> for MemberResponse {
    fn from(m: &Membership) -> Self {
        MemberResponse {
            user_id: m.user_id,
            warehouse_id: m.warehouse_id,
            created_at: m.created_at,
        }
    }
}
