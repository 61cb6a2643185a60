// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

diesel::table! {
    users (id) {
        id -> Uuid,
        email -> Varchar,
        password_hash -> Varchar,
        display_name -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    warehouses (id) {
        id -> Uuid,
        name -> Varchar,
        created_by -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    memberships (user_id, warehouse_id) {
        user_id -> Uuid,
        warehouse_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    boxes (id) {
        id -> Uuid,
        warehouse_id -> Uuid,
        parent_box_id -> Nullable<Uuid>,
        name -> Varchar,
        description -> Nullable<Varchar>,
        physical_location -> Nullable<Varchar>,
        qr_token -> Varchar,
        short_code -> Varchar,
        version -> Int4,
        deleted_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    items (id) {
        id -> Uuid,
        warehouse_id -> Uuid,
        box_id -> Uuid,
        name -> Varchar,
        description -> Nullable<Varchar>,
        photo_url -> Nullable<Varchar>,
        physical_location -> Nullable<Varchar>,
        tags -> Jsonb,
        aliases -> Jsonb,
        version -> Int4,
        deleted_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    item_favorites (user_id, item_id) {
        user_id -> Uuid,
        item_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    stock_movements (id) {
        id -> Uuid,
        warehouse_id -> Uuid,
        item_id -> Uuid,
        delta -> Int4,
        command_id -> Varchar,
        note -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    change_log (seq) {
        seq -> Int8,
        warehouse_id -> Uuid,
        entity_type -> Varchar,
        entity_id -> Nullable<Uuid>,
        action -> Varchar,
        entity_version -> Nullable<Int4>,
        payload_json -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    processed_commands (command_id) {
        command_id -> Varchar,
        warehouse_id -> Uuid,
        user_id -> Uuid,
        device_id -> Varchar,
        processed_at -> Timestamptz,
        result_hash -> Nullable<Varchar>,
    }
}

diesel::table! {
    sync_conflicts (id) {
        id -> Uuid,
        warehouse_id -> Uuid,
        command_id -> Varchar,
        entity_type -> Varchar,
        entity_id -> Uuid,
        base_version -> Nullable<Int4>,
        server_version -> Nullable<Int4>,
        client_payload_json -> Jsonb,
        status -> Varchar,
        created_by -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        resolved_at -> Nullable<Timestamptz>,
        resolved_by -> Nullable<Uuid>,
    }
}

diesel::table! {
    warehouse_invites (id) {
        id -> Uuid,
        warehouse_id -> Uuid,
        invited_by -> Uuid,
        invitee_email -> Nullable<Varchar>,
        token_hash -> Varchar,
        expires_at -> Timestamptz,
        accepted_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    activity_events (id) {
        id -> Uuid,
        warehouse_id -> Uuid,
        actor_user_id -> Uuid,
        event_type -> Varchar,
        entity_type -> Nullable<Varchar>,
        entity_id -> Nullable<Uuid>,
        metadata_json -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    smtp_settings (warehouse_id) {
        warehouse_id -> Uuid,
        host -> Varchar,
        port -> Int4,
        username -> Nullable<Varchar>,
        password_encrypted -> Nullable<Varchar>,
        encryption_mode -> Varchar,
        from_address -> Varchar,
        from_name -> Nullable<Varchar>,
        updated_by -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    llm_settings (warehouse_id) {
        warehouse_id -> Uuid,
        provider -> Varchar,
        api_key_encrypted -> Nullable<Varchar>,
        auto_tags_enabled -> Bool,
        auto_alias_enabled -> Bool,
        updated_by -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    refresh_tokens (id) {
        id -> Uuid,
        user_id -> Uuid,
        token_hash -> Varchar,
        expires_at -> Timestamptz,
        revoked -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    password_reset_tokens (id) {
        id -> Uuid,
        user_id -> Uuid,
        token_hash -> Varchar,
        expires_at -> Timestamptz,
        used -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    users,
    warehouses,
    memberships,
    boxes,
    items,
    item_favorites,
    stock_movements,
    change_log,
    processed_commands,
    sync_conflicts,
    warehouse_invites,
    activity_events,
    smtp_settings,
    llm_settings,
    refresh_tokens,
    password_reset_tokens,
);
