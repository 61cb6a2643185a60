// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::{WarehouseError, WarehouseResult};
use crate::extractors::CurrentUser;
use crate::models::item::Item;
use crate::models::settings::{
    LlmSetting, LlmSettingsResponse, NewLlmSetting, NewSmtpSetting, SmtpSetting, SmtpSettingsResponse,
};
use crate::schema::{items, llm_settings, memberships, smtp_settings};
use crate::services::activity::record_activity;
use crate::services::enrichment::generate_tags_and_aliases;
use crate::services::secret_store::{decrypt_secret, encrypt_secret, mask_secret};
use crate::services::sync_log::append_change_log;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings/:warehouse_id/smtp", get(get_smtp_settings).put(update_smtp_settings))
        .route("/settings/:warehouse_id/smtp/test", post(test_smtp_settings))
        .route("/settings/:warehouse_id/llm", get(get_llm_settings).put(update_llm_settings))
        .route(
            "/settings/:warehouse_id/llm/reprocess-item/:item_id",
            post(reprocess_llm_item),
        )
}

fn ensure_membership(conn: &mut PgConnection, warehouse_id: Uuid, user_id: Uuid) -> WarehouseResult<()> {
    let exists = memberships::table
        .find((user_id, warehouse_id))
        .first::<crate::models::warehouse::Membership>(conn)
        .optional()?;
    if exists.is_none() {
        return Err(WarehouseError::Forbidden("no access to warehouse".to_string()));
    }
    Ok(())
}

#[derive(Deserialize)]
struct SmtpSettingsUpdateRequest {
    host: String,
    port: i32,
    username: Option<String>,
    password: Option<String>,
    encryption_mode: String,
    from_address: String,
    from_name: Option<String>,
}

#[derive(Deserialize)]
struct SmtpTestRequest {
    to_email: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Deserialize)]
struct LlmSettingsUpdateRequest {
    provider: String,
    auto_tags_enabled: bool,
    auto_alias_enabled: bool,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct LlmReprocessResponse {
    message: String,
    item_id: Uuid,
}

fn smtp_response(config: &AppConfig, warehouse_id: Uuid, setting: Option<SmtpSetting>) -> SmtpSettingsResponse {
    let Some(setting) = setting else {
        return SmtpSettingsResponse {
            warehouse_id,
            host: None,
            port: None,
            username: None,
            encryption_mode: None,
            from_address: None,
            from_name: None,
            has_password: false,
            password_masked: None,
        };
    };
    let password_masked = setting
        .password_encrypted
        .as_deref()
        .and_then(|enc| decrypt_secret(config, enc).ok())
        .and_then(|plain| mask_secret(Some(&plain)));
    SmtpSettingsResponse {
        warehouse_id,
        host: Some(setting.host),
        port: Some(setting.port),
        username: setting.username,
        encryption_mode: Some(setting.encryption_mode),
        from_address: Some(setting.from_address),
        from_name: setting.from_name,
        has_password: setting.password_encrypted.is_some(),
        password_masked,
    }
}

async fn get_smtp_settings(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
    Path(warehouse_id): Path<Uuid>,
) -> WarehouseResult<Json<SmtpSettingsResponse>> {
    let mut conn = state.conn()?;
    ensure_membership(&mut conn, warehouse_id, current_user.id)?;
    let setting: Option<SmtpSetting> = smtp_settings::table.find(warehouse_id).first(&mut conn).optional()?;
    Ok(Json(smtp_response(&state.config, warehouse_id, setting)))
}

async fn update_smtp_settings(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
    Path(warehouse_id): Path<Uuid>,
    Json(payload): Json<SmtpSettingsUpdateRequest>,
) -> WarehouseResult<Json<SmtpSettingsResponse>> {
    let mut conn = state.conn()?;
    ensure_membership(&mut conn, warehouse_id, current_user.id)?;

    let existing: Option<SmtpSetting> = smtp_settings::table.find(warehouse_id).first(&mut conn).optional()?;
    let password_encrypted = match (&payload.password, existing.as_ref()) {
        (Some(password), _) => Some(encrypt_secret(&state.config, password)?),
        (None, Some(existing)) => existing.password_encrypted.clone(),
        (None, None) => None,
    };

    let row = NewSmtpSetting {
        warehouse_id,
        host: payload.host,
        port: payload.port,
        username: payload.username,
        password_encrypted,
        encryption_mode: payload.encryption_mode,
        from_address: payload.from_address,
        from_name: payload.from_name,
        updated_by: current_user.id,
    };
    diesel::insert_into(smtp_settings::table)
        .values(&row)
        .on_conflict(smtp_settings::warehouse_id)
        .do_update()
        .set(&row)
        .execute(&mut conn)?;

    record_activity(
        &mut conn,
        warehouse_id,
        current_user.id,
        "settings.smtp.updated",
        Some("smtp_setting"),
        Some(warehouse_id),
        None,
    )?;

    let setting: Option<SmtpSetting> = smtp_settings::table.find(warehouse_id).first(&mut conn).optional()?;
    Ok(Json(smtp_response(&state.config, warehouse_id, setting)))
}

async fn test_smtp_settings(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
    Path(warehouse_id): Path<Uuid>,
    Json(payload): Json<SmtpTestRequest>,
) -> WarehouseResult<Json<MessageResponse>> {
    let mut conn = state.conn()?;
    ensure_membership(&mut conn, warehouse_id, current_user.id)?;
    let setting: Option<SmtpSetting> = smtp_settings::table.find(warehouse_id).first(&mut conn).optional()?;
    let Some(setting) = setting else {
        return Err(WarehouseError::InvalidInput("smtp settings not configured".to_string()));
    };
    if setting.host.is_empty() || setting.from_address.is_empty() {
        return Err(WarehouseError::InvalidInput("smtp settings incomplete".to_string()));
    }
    Ok(Json(MessageResponse {
        message: format!("SMTP test queued for {} (simulated)", payload.to_email),
    }))
}

fn llm_response(config: &AppConfig, warehouse_id: Uuid, setting: Option<LlmSetting>) -> LlmSettingsResponse {
    let Some(setting) = setting else {
        return LlmSettingsResponse {
            warehouse_id,
            provider: "gemini".to_string(),
            auto_tags_enabled: true,
            auto_alias_enabled: true,
            has_api_key: false,
            api_key_masked: None,
        };
    };
    let api_key_masked = setting
        .api_key_encrypted
        .as_deref()
        .and_then(|enc| decrypt_secret(config, enc).ok())
        .and_then(|plain| mask_secret(Some(&plain)));
    LlmSettingsResponse {
        warehouse_id,
        provider: setting.provider,
        auto_tags_enabled: setting.auto_tags_enabled,
        auto_alias_enabled: setting.auto_alias_enabled,
        has_api_key: setting.api_key_encrypted.is_some(),
        api_key_masked,
    }
}

async fn get_llm_settings(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
    Path(warehouse_id): Path<Uuid>,
) -> WarehouseResult<Json<LlmSettingsResponse>> {
    let mut conn = state.conn()?;
    ensure_membership(&mut conn, warehouse_id, current_user.id)?;
    let setting: Option<LlmSetting> = llm_settings::table.find(warehouse_id).first(&mut conn).optional()?;
    Ok(Json(llm_response(&state.config, warehouse_id, setting)))
}

async fn update_llm_settings(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
    Path(warehouse_id): Path<Uuid>,
    Json(payload): Json<LlmSettingsUpdateRequest>,
) -> WarehouseResult<Json<LlmSettingsResponse>> {
    let mut conn = state.conn()?;
    ensure_membership(&mut conn, warehouse_id, current_user.id)?;

    let existing: Option<LlmSetting> = llm_settings::table.find(warehouse_id).first(&mut conn).optional()?;
    let api_key_encrypted = match (&payload.api_key, existing.as_ref()) {
        (Some(key), _) => Some(encrypt_secret(&state.config, key)?),
        (None, Some(existing)) => existing.api_key_encrypted.clone(),
        (None, None) => None,
    };

    let row = NewLlmSetting {
        warehouse_id,
        provider: payload.provider,
        api_key_encrypted,
        auto_tags_enabled: payload.auto_tags_enabled,
        auto_alias_enabled: payload.auto_alias_enabled,
        updated_by: current_user.id,
    };
    diesel::insert_into(llm_settings::table)
        .values(&row)
        .on_conflict(llm_settings::warehouse_id)
        .do_update()
        .set(&row)
        .execute(&mut conn)?;

    record_activity(
        &mut conn,
        warehouse_id,
        current_user.id,
        "settings.llm.updated",
        Some("llm_setting"),
        Some(warehouse_id),
        None,
    )?;

    let setting: Option<LlmSetting> = llm_settings::table.find(warehouse_id).first(&mut conn).optional()?;
    Ok(Json(llm_response(&state.config, warehouse_id, setting)))
}

async fn reprocess_llm_item(
    State(state): State<AppState>,
    CurrentUser(current_user): CurrentUser,
    Path((warehouse_id, item_id)): Path<(Uuid, Uuid)>,
) -> WarehouseResult<Json<LlmReprocessResponse>> {
    let mut conn = state.conn()?;
    ensure_membership(&mut conn, warehouse_id, current_user.id)?;

    let item: Option<Item> = items::table
        .find(item_id)
        .filter(items::warehouse_id.eq(warehouse_id))
        .filter(items::deleted_at.is_null())
        .first(&mut conn)
        .optional()?;
    let item = item.ok_or_else(|| WarehouseError::NotFound("item not found".to_string()))?;

    let llm_setting: Option<LlmSetting> = llm_settings::table.find(warehouse_id).first(&mut conn).optional()?;
    let llm_setting = llm_setting.ok_or_else(|| WarehouseError::InvalidInput("llm settings not configured".to_string()))?;

    let (generated_tags, generated_aliases) = generate_tags_and_aliases(&item.name, item.description.as_deref());

    let new_tags = if llm_setting.auto_tags_enabled {
        crate::models::item::strings_to_json(&generated_tags)
    } else {
        item.tags.clone()
    };
    let new_aliases = if llm_setting.auto_alias_enabled {
        crate::models::item::strings_to_json(&generated_aliases)
    } else {
        item.aliases.clone()
    };
    let new_version = item.version + 1;

    conn.build_transaction().read_write().run(|conn| -> WarehouseResult<()> {
        diesel::update(items::table.find(item_id))
            .set((
                items::tags.eq(&new_tags),
                items::aliases.eq(&new_aliases),
                items::version.eq(new_version),
            ))
            .execute(conn)?;

        record_activity(
            conn,
            warehouse_id,
            current_user.id,
            "llm.reprocess.item",
            Some("item"),
            Some(item_id),
            Some(json!({
                "tags_count": new_tags.as_array().map(|a| a.len()).unwrap_or(0),
                "aliases_count": new_aliases.as_array().map(|a| a.len()).unwrap_or(0),
            })),
        )?;
        append_change_log(conn, warehouse_id, "item", "update", Some(item_id), Some(new_version), None)?;
        Ok(())
    })?;

    Ok(Json(LlmReprocessResponse {
        message: "Item reprocessed".to_string(),
        item_id,
    }))
}
