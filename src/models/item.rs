// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::schema::{item_favorites, items};

#[derive(Queryable, Identifiable, AsChangeset, Clone, Debug)]
#[diesel(table_name = items)]
pub struct Item {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub box_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub physical_location: Option<String>,
    pub tags: Value,
    pub aliases: Value,
    pub version: i32,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn tags_vec(&self) -> Vec<String> {
        json_to_strings(&self.tags)
    }

    pub fn aliases_vec(&self) -> Vec<String> {
        json_to_strings(&self.aliases)
    }
}

fn json_to_strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn strings_to_json(values: &[String]) -> Value {
    Value::Array(values.iter().map(|s| Value::String(s.clone())).collect())
}

#[derive(Insertable, Debug)]
#[diesel(table_name = items)]
pub struct NewItem {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub box_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub physical_location: Option<String>,
    pub tags: Value,
    pub aliases: Value,
}

#[derive(Serialize, Debug, Clone)]
pub struct ItemResponse {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub box_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub physical_location: Option<String>,
    pub tags: Vec<String>,
    pub aliases: Vec<String>,
    pub version: i32,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub stock: i64,
    pub is_favorite: bool,
    pub box_path: Vec<String>,
}

impl Item {
    pub fn to_response(&self, stock: i64, is_favorite: bool, box_path: Vec<String>) -> ItemResponse {
        ItemResponse {
            id: self.id,
            warehouse_id: self.warehouse_id,
            box_id: self.box_id,
            name: self.name.clone(),
            description: self.description.clone(),
            photo_url: self.photo_url.clone(),
            physical_location: self.physical_location.clone(),
            tags: self.tags_vec(),
            aliases: self.aliases_vec(),
            version: self.version,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            stock,
            is_favorite,
            box_path,
        }
    }
}

#[derive(Queryable, Identifiable, Clone, Debug)]
#[diesel(table_name = item_favorites, primary_key(user_id, item_id))]
pub struct ItemFavorite {
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = item_favorites)]
pub struct NewItemFavorite {
    pub user_id: Uuid,
    pub item_id: Uuid,
}
