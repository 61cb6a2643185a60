// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{llm_settings, smtp_settings};

#[derive(Queryable, Identifiable, AsChangeset, Clone, Debug)]
#[diesel(table_name = smtp_settings, primary_key(warehouse_id))]
pub struct SmtpSetting {
    pub warehouse_id: Uuid,
    pub host: String,
    pub port: i32,
    pub username: Option<String>,
    pub password_encrypted: Option<String>,
    pub encryption_mode: String,
    pub from_address: String,
    pub from_name: Option<String>,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = smtp_settings)]
pub struct NewSmtpSetting {
    pub warehouse_id: Uuid,
    pub host: String,
    pub port: i32,
    pub username: Option<String>,
    pub password_encrypted: Option<String>,
    pub encryption_mode: String,
    pub from_address: String,
    pub from_name: Option<String>,
    pub updated_by: Uuid,
}

#[derive(Serialize, Debug)]
pub struct SmtpSettingsResponse {
    pub warehouse_id: Uuid,
    pub host: Option<String>,
    pub port: Option<i32>,
    pub username: Option<String>,
    pub encryption_mode: Option<String>,
    pub from_address: Option<String>,
    pub from_name: Option<String>,
    pub has_password: bool,
    pub password_masked: Option<String>,
}

#[derive(Queryable, Identifiable, AsChangeset, Clone, Debug)]
#[diesel(table_name = llm_settings, primary_key(warehouse_id))]
pub struct LlmSetting {
    pub warehouse_id: Uuid,
    pub provider: String,
    pub api_key_encrypted: Option<String>,
    pub auto_tags_enabled: bool,
    pub auto_alias_enabled: bool,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = llm_settings)]
pub struct NewLlmSetting {
    pub warehouse_id: Uuid,
    pub provider: String,
    pub api_key_encrypted: Option<String>,
    pub auto_tags_enabled: bool,
    pub auto_alias_enabled: bool,
    pub updated_by: Uuid,
}

#[derive(Serialize, Debug)]
pub struct LlmSettingsResponse {
    pub warehouse_id: Uuid,
    pub provider: String,
    pub auto_tags_enabled: bool,
    pub auto_alias_enabled: bool,
    pub has_api_key: bool,
    pub api_key_masked: Option<String>,
}
