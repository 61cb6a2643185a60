// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::{WarehouseError, WarehouseResult};
use crate::extractors::{CurrentUser, WarehouseMembership};
use crate::models::warehouse::{MemberResponse, Membership, NewMembership, NewWarehouse, Warehouse, WarehouseResponse};
use crate::schema::{memberships, warehouses};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/warehouses", get(list_warehouses).post(create_warehouse))
        .route("/warehouses/:warehouse_id", get(get_warehouse))
        .route("/warehouses/:warehouse_id/members", get(get_members))
}

#[derive(Deserialize)]
struct WarehouseCreateRequest {
    name: String,
}

async fn list_warehouses(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
) -> WarehouseResult<Json<Vec<WarehouseResponse>>> {
    let mut conn = state.conn()?;
    let rows: Vec<Warehouse> = warehouses::table
        .inner_join(memberships::table.on(memberships::warehouse_id.eq(warehouses::id)))
        .filter(memberships::user_id.eq(current_user.id))
        .select(warehouses::all_columns)
        .order(warehouses::created_at.desc())
        .load(&mut conn)?;
    Ok(Json(rows.iter().map(WarehouseResponse::from).collect()))
}

async fn create_warehouse(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
    Json(payload): Json<WarehouseCreateRequest>,
) -> WarehouseResult<(StatusCode, Json<WarehouseResponse>)> {
    let mut conn = state.conn()?;
    let warehouse: Warehouse = conn
        .build_transaction()
        .read_write()
        .run(|conn| -> diesel::result::QueryResult<Warehouse> {
            let new_warehouse = NewWarehouse {
                id: Uuid::new_v4(),
                name: payload.name.trim().to_string(),
                created_by: current_user.id,
            };
            let warehouse: Warehouse = diesel::insert_into(warehouses::table)
                .values(&new_warehouse)
                .get_result(conn)?;

            diesel::insert_into(memberships::table)
                .values(&NewMembership {
                    user_id: current_user.id,
                    warehouse_id: warehouse.id,
                })
                .execute(conn)?;

            Ok(warehouse)
        })?;
    Ok((StatusCode::CREATED, Json(WarehouseResponse::from(&warehouse))))
}

async fn get_warehouse(
    State(state): State<AppState>,
    _membership: WarehouseMembership,
    Path(warehouse_id): Path<Uuid>,
) -> WarehouseResult<Json<WarehouseResponse>> {
    let mut conn = state.conn()?;
    let warehouse: Warehouse = warehouses::table
        .find(warehouse_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| WarehouseError::NotFound("warehouse not found".to_string()))?;
    Ok(Json(WarehouseResponse::from(&warehouse)))
}

async fn get_members(
    State(state): State<AppState>,
    _membership: WarehouseMembership,
    Path(warehouse_id): Path<Uuid>,
) -> WarehouseResult<Json<Vec<MemberResponse>>> {
    let mut conn = state.conn()?;
    let rows: Vec<Membership> = memberships::table
        .filter(memberships::warehouse_id.eq(warehouse_id))
        .load(&mut conn)?;
    Ok(Json(rows.iter().map(MemberResponse::from).collect()))
}
