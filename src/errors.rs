// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("invalid input: `{0}`")]
    InvalidInput(String),

    #[error("unauthenticated: `{0}`")]
    Unauthenticated(String),

    #[error("forbidden: `{0}`")]
    Forbidden(String),

    #[error("not found: `{0}`")]
    NotFound(String),

    #[error("conflict: `{0}`")]
    Conflict(String),

    #[error("failed to read PostgresDB with error: `{0}`")]
    PostgresReadError(String),

    #[error("failed to commit changes to PostgresDB with error: `{0}`")]
    PostgresWriteError(String),

    #[error(transparent)]
    Postgres(#[from] diesel::result::Error),

    #[error("failed to build PG connection pool with error: `{0}`")]
    PgConnectionPoolInitError(String),

    #[error("failed to get a pool connection from PG connection pool with error: `{0}`")]
    PgPoolConnectionError(String),

    #[error("failed to serialize/deserialize with error: `{0}`")]
    SerdeError(String),

    #[error(transparent)]
    Uncategorized(#[from] anyhow::Error),
}

impl WarehouseError {
    pub fn name(&self) -> &'static str {
        match self {
            WarehouseError::InvalidInput(_) => "InvalidInput",
            WarehouseError::Unauthenticated(_) => "Unauthenticated",
            WarehouseError::Forbidden(_) => "Forbidden",
            WarehouseError::NotFound(_) => "NotFound",
            WarehouseError::Conflict(_) => "Conflict",
            WarehouseError::PostgresReadError(_) => "PostgresReadError",
            WarehouseError::PostgresWriteError(_) => "PostgresWriteError",
            WarehouseError::Postgres(_) => "Postgres",
            WarehouseError::PgConnectionPoolInitError(_) => "PgConnectionPoolInitError",
            WarehouseError::PgPoolConnectionError(_) => "PgPoolConnectionError",
            WarehouseError::SerdeError(_) => "SerdeError",
            WarehouseError::Uncategorized(_) => "Uncategorized",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            WarehouseError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            WarehouseError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            WarehouseError::Forbidden(_) => StatusCode::FORBIDDEN,
            WarehouseError::NotFound(_) => StatusCode::NOT_FOUND,
            WarehouseError::Conflict(_) => StatusCode::CONFLICT,
            WarehouseError::Postgres(diesel::result::Error::NotFound) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short, user-visible message. No stack traces, no internal identifiers (SPEC_FULL.md §7).
    fn detail(&self) -> String {
        match self {
            WarehouseError::InvalidInput(m)
            | WarehouseError::Unauthenticated(m)
            | WarehouseError::Forbidden(m)
            | WarehouseError::NotFound(m)
            | WarehouseError::Conflict(m) => m.clone(),
            WarehouseError::Postgres(diesel::result::Error::NotFound) => {
                "not found".to_string()
            }
            _ => "internal error".to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for WarehouseError {
    fn into_response(self) -> Response {
        if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(kind = self.name(), error = %self, "request failed");
        }
        let status = self.status_code();
        let body = ErrorBody {
            detail: self.detail(),
        };
        (status, Json(body)).into_response()
    }
}

pub type WarehouseResult<T> = Result<T, WarehouseError>;
