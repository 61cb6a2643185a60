// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{WarehouseError, WarehouseResult};
use crate::extractors::CurrentUser;
use crate::models::auth_token::{NewPasswordResetToken, NewRefreshToken, PasswordResetToken, RefreshToken};
use crate::models::user::{NewUser, User, UserResponse};
use crate::schema::{password_reset_tokens, refresh_tokens, users};
use crate::services::security::{
    build_access_token, build_refresh_token, decode_token, hash_password, hash_token, verify_password,
    TOKEN_TYPE_REFRESH,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/change-password", post(change_password))
        .route("/auth/me", get(me))
}

#[derive(Deserialize)]
struct SignupRequest {
    email: String,
    password: String,
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Deserialize)]
struct ForgotPasswordRequest {
    email: String,
}

#[derive(Serialize)]
struct ForgotPasswordResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reset_token: Option<String>,
}

#[derive(Deserialize)]
struct ResetPasswordRequest {
    token: String,
    new_password: String,
}

#[derive(Deserialize)]
struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> WarehouseResult<(StatusCode, Json<UserResponse>)> {
    let mut conn = state.conn()?;
    let email = payload.email.to_lowercase();

    let exists: Option<User> = users::table
        .filter(users::email.eq(&email))
        .first(&mut conn)
        .optional()?;
    if exists.is_some() {
        return Err(WarehouseError::Conflict("email already exists".to_string()));
    }

    let new_user = NewUser {
        id: Uuid::new_v4(),
        email,
        password_hash: hash_password(&payload.password)?,
        display_name: payload.display_name,
    };
    let user: User = diesel::insert_into(users::table)
        .values(&new_user)
        .get_result(&mut conn)?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> WarehouseResult<Json<TokenResponse>> {
    let mut conn = state.conn()?;
    let email = payload.email.to_lowercase();

    let user: Option<User> = users::table
        .filter(users::email.eq(&email))
        .first(&mut conn)
        .optional()?;
    let user = user.filter(|u| verify_password(&payload.password, &u.password_hash));
    let Some(user) = user else {
        return Err(WarehouseError::Unauthenticated("invalid credentials".to_string()));
    };

    let access_token = build_access_token(&state.config, user.id)?;
    let refresh_token = build_refresh_token(&state.config, user.id)?;
    let row = NewRefreshToken {
        id: Uuid::new_v4(),
        user_id: user.id,
        token_hash: hash_token(&refresh_token),
        expires_at: Utc::now() + Duration::days(state.config.refresh_token_days),
    };
    diesel::insert_into(refresh_tokens::table).values(&row).execute(&mut conn)?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token,
    }))
}

async fn refresh(State(state): State<AppState>, Json(payload): Json<RefreshRequest>) -> WarehouseResult<Json<TokenResponse>> {
    let claims = decode_token(&state.config, &payload.refresh_token)
        .map_err(|_| WarehouseError::Unauthenticated("invalid refresh token".to_string()))?;
    if claims.token_type != TOKEN_TYPE_REFRESH {
        return Err(WarehouseError::Unauthenticated("invalid refresh token type".to_string()));
    }

    let mut conn = state.conn()?;
    let token_hash_value = hash_token(&payload.refresh_token);
    let stored: Option<RefreshToken> = refresh_tokens::table
        .filter(refresh_tokens::token_hash.eq(&token_hash_value))
        .first(&mut conn)
        .optional()?;
    let Some(stored) = stored else {
        return Err(WarehouseError::Unauthenticated("refresh token expired".to_string()));
    };
    if stored.revoked || stored.expires_at < Utc::now() {
        return Err(WarehouseError::Unauthenticated("refresh token expired".to_string()));
    }

    diesel::update(refresh_tokens::table.find(stored.id))
        .set(refresh_tokens::revoked.eq(true))
        .execute(&mut conn)?;

    let access_token = build_access_token(&state.config, stored.user_id)?;
    let new_refresh = build_refresh_token(&state.config, stored.user_id)?;
    let row = NewRefreshToken {
        id: Uuid::new_v4(),
        user_id: stored.user_id,
        token_hash: hash_token(&new_refresh),
        expires_at: Utc::now() + Duration::days(state.config.refresh_token_days),
    };
    diesel::insert_into(refresh_tokens::table).values(&row).execute(&mut conn)?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token: new_refresh,
    }))
}

async fn logout(State(state): State<AppState>, Json(payload): Json<RefreshRequest>) -> WarehouseResult<Json<MessageResponse>> {
    let mut conn = state.conn()?;
    let token_hash_value = hash_token(&payload.refresh_token);
    diesel::update(refresh_tokens::table.filter(refresh_tokens::token_hash.eq(&token_hash_value)))
        .set(refresh_tokens::revoked.eq(true))
        .execute(&mut conn)?;
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> WarehouseResult<Json<ForgotPasswordResponse>> {
    let mut conn = state.conn()?;
    let email = payload.email.to_lowercase();
    let user: Option<User> = users::table
        .filter(users::email.eq(&email))
        .first(&mut conn)
        .optional()?;
    let Some(user) = user else {
        return Ok(Json(ForgotPasswordResponse {
            message: "If the email exists, reset instructions were generated".to_string(),
            reset_token: None,
        }));
    };

    let raw_token = format!("{}{}", Uuid::new_v4(), Uuid::new_v4()).replace('-', "");
    let row = NewPasswordResetToken {
        id: Uuid::new_v4(),
        user_id: user.id,
        token_hash: hash_token(&raw_token),
        expires_at: Utc::now() + Duration::hours(1),
    };
    diesel::insert_into(password_reset_tokens::table)
        .values(&row)
        .execute(&mut conn)?;

    // Dev bootstrap: expose the token until the SMTP flow (§4.9) is wired to a real provider.
    let reset_token = if state.config.dev_expose_reset_token {
        Some(raw_token)
    } else {
        None
    };
    Ok(Json(ForgotPasswordResponse {
        message: "Reset token generated".to_string(),
        reset_token,
    }))
}

async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> WarehouseResult<Json<MessageResponse>> {
    let mut conn = state.conn()?;
    let token_hash_value = hash_token(&payload.token);
    let reset_token: Option<PasswordResetToken> = password_reset_tokens::table
        .filter(password_reset_tokens::token_hash.eq(&token_hash_value))
        .first(&mut conn)
        .optional()?;
    let Some(reset_token) = reset_token else {
        return Err(WarehouseError::InvalidInput("invalid or expired token".to_string()));
    };
    if reset_token.used || reset_token.expires_at < Utc::now() {
        return Err(WarehouseError::InvalidInput("invalid or expired token".to_string()));
    }

    let new_hash = hash_password(&payload.new_password)?;
    diesel::update(users::table.find(reset_token.user_id))
        .set(users::password_hash.eq(new_hash))
        .execute(&mut conn)?;
    diesel::update(password_reset_tokens::table.find(reset_token.id))
        .set(password_reset_tokens::used.eq(true))
        .execute(&mut conn)?;
    diesel::update(refresh_tokens::table.filter(refresh_tokens::user_id.eq(reset_token.user_id)))
        .set(refresh_tokens::revoked.eq(true))
        .execute(&mut conn)?;

    Ok(Json(MessageResponse {
        message: "Password reset successfully".to_string(),
    }))
}

async fn change_password(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> WarehouseResult<Json<MessageResponse>> {
    if !verify_password(&payload.current_password, &current_user.password_hash) {
        return Err(WarehouseError::InvalidInput("current password is incorrect".to_string()));
    }

    let mut conn = state.conn()?;
    let new_hash = hash_password(&payload.new_password)?;
    diesel::update(users::table.find(current_user.id))
        .set(users::password_hash.eq(new_hash))
        .execute(&mut conn)?;
    diesel::update(refresh_tokens::table.filter(refresh_tokens::user_id.eq(current_user.id)))
        .set(refresh_tokens::revoked.eq(true))
        .execute(&mut conn)?;

    Ok(Json(MessageResponse {
        message: "Password changed".to_string(),
    }))
}

async fn me(CurrentUser(current_user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(&current_user))
}
