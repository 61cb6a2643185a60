// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::WarehouseError;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenClaims {
    pub sub: Uuid,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

pub fn hash_password(password: &str) -> Result<String, WarehouseError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| WarehouseError::Uncategorized(anyhow::anyhow!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn build_access_token(config: &AppConfig, user_id: Uuid) -> Result<String, WarehouseError> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id,
        token_type: TOKEN_TYPE_ACCESS.to_string(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::minutes(config.access_token_minutes)).timestamp(),
        jti: None,
    };
    encode_claims(config, &claims)
}

pub fn build_refresh_token(config: &AppConfig, user_id: Uuid) -> Result<String, WarehouseError> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id,
        token_type: TOKEN_TYPE_REFRESH.to_string(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::days(config.refresh_token_days)).timestamp(),
        jti: Some(Uuid::new_v4().to_string()),
    };
    encode_claims(config, &claims)
}

fn encode_claims(config: &AppConfig, claims: &TokenClaims) -> Result<String, WarehouseError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| WarehouseError::Uncategorized(anyhow::anyhow!("token encoding failed: {e}")))
}

pub fn decode_token(config: &AppConfig, token: &str) -> Result<TokenClaims, WarehouseError> {
    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| WarehouseError::Unauthenticated("could not validate credentials".to_string()))
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/test".to_string(),
            app_name: "my-warehouse".to_string(),
            api_v1_prefix: "/api/v1".to_string(),
            jwt_secret: "jwt-secret-for-tests".to_string(),
            jwt_algorithm: "HS256".to_string(),
            access_token_minutes: 30,
            refresh_token_days: 30,
            frontend_url: "http://localhost:5173".to_string(),
            secret_encryption_key: "encryption-key-for-tests".to_string(),
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
            metrics_port: 9184,
            dev_expose_reset_token: false,
        }
    }

    #[test]
    fn password_hash_verifies_correct_and_rejects_wrong() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn hashing_the_same_password_twice_yields_different_hashes() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b, "argon2 salts should differ per hash");
    }

    #[test]
    fn access_and_refresh_tokens_round_trip_with_distinct_types() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let access = build_access_token(&config, user_id).unwrap();
        let claims = decode_token(&config, &access).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.token_type, TOKEN_TYPE_ACCESS);
        assert!(claims.jti.is_none());

        let refresh = build_refresh_token(&config, user_id).unwrap();
        let claims = decode_token(&config, &refresh).unwrap();
        assert_eq!(claims.token_type, TOKEN_TYPE_REFRESH);
        assert!(claims.jti.is_some());
    }

    #[test]
    fn decoding_a_token_signed_with_a_different_secret_fails() {
        let config = test_config();
        let token = build_access_token(&config, Uuid::new_v4()).unwrap();

        let mut other = test_config();
        other.jwt_secret = "a-different-secret-entirely".to_string();
        assert!(decode_token(&other, &token).is_err());
    }

    #[test]
    fn hash_token_is_deterministic_and_hex_encoded() {
        let a = hash_token("refresh-token-value");
        let b = hash_token("refresh-token-value");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
