// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::RequestPartsExt;
use diesel::prelude::*;
use uuid::Uuid;

use crate::errors::WarehouseError;
use crate::models::user::User;
use crate::models::warehouse::Membership;
use crate::services::security::{decode_token, TOKEN_TYPE_ACCESS};
use crate::state::AppState;

/// The authenticated caller, resolved from a bearer access token (SPEC_FULL.md §4.10,
/// grounded in `get_current_user`).
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = WarehouseError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| WarehouseError::Unauthenticated("missing bearer token".to_string()))?;

        let claims = decode_token(&app_state.config, bearer)?;
        if claims.token_type != TOKEN_TYPE_ACCESS {
            return Err(WarehouseError::Unauthenticated(
                "could not validate credentials".to_string(),
            ));
        }

        let mut conn = app_state.conn()?;
        let user: User = crate::schema::users::table
            .find(claims.sub)
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| WarehouseError::Unauthenticated("could not validate credentials".to_string()))?;

        Ok(CurrentUser(user))
    }
}

/// Proof of membership in the warehouse named by the `warehouse_id` path segment
/// (SPEC_FULL.md §4.1, grounded in `require_warehouse_membership`). Extracting this
/// also extracts `CurrentUser` as a side effect, available via `.user`.
#[derive(Clone, Debug)]
pub struct WarehouseMembership {
    pub user: User,
    pub membership: Membership,
}

impl<S> FromRequestParts<S> for WarehouseMembership
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = WarehouseError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        let axum::extract::Path(params): axum::extract::Path<std::collections::HashMap<String, String>> =
            parts
                .extract()
                .await
                .map_err(|_| WarehouseError::InvalidInput("missing warehouse_id path segment".to_string()))?;
        let warehouse_id: Uuid = params
            .get("warehouse_id")
            .ok_or_else(|| WarehouseError::InvalidInput("missing warehouse_id path segment".to_string()))?
            .parse()
            .map_err(|_| WarehouseError::InvalidInput("invalid warehouse_id".to_string()))?;

        let mut conn = app_state.conn()?;
        let membership: Membership = crate::schema::memberships::table
            .find((user.id, warehouse_id))
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| WarehouseError::Forbidden("no access to warehouse".to_string()))?;

        Ok(WarehouseMembership { user, membership })
    }
}

/// Membership check for handlers that take `warehouse_id` from the request body or a
/// query string rather than a path segment (the sync endpoints, SPEC_FULL.md §6, are not
/// warehouse-nested routes the way boxes/items are).
pub fn require_membership(conn: &mut PgConnection, user_id: Uuid, warehouse_id: Uuid) -> Result<Membership, WarehouseError> {
    crate::schema::memberships::table
        .find((user_id, warehouse_id))
        .first(conn)
        .optional()?
        .ok_or_else(|| WarehouseError::Forbidden("no access to warehouse".to_string()))
}
