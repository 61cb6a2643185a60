// Copyright (c) My Warehouse Engineering
// SPDX-License-Identifier: Apache-2.0

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::config::AppConfig;
use crate::errors::WarehouseError;

const NONCE_LEN: usize = 12;

fn cipher_for(config: &AppConfig) -> Aes256Gcm {
    let mut hasher = Sha256::new();
    hasher.update(config.secret_encryption_key.as_bytes());
    hasher.update(b":");
    hasher.update(config.jwt_secret.as_bytes());
    let key = hasher.finalize();
    Aes256Gcm::new_from_slice(&key).expect("sha256 digest is exactly 32 bytes")
}

/// Encrypts `plain_text` with AES-256-GCM keyed by `SHA-256(secret_encryption_key ":" jwt_secret)`.
/// A Rust-native substitute for the source's JOSE/JWE `dir`+`A256GCM` scheme (SPEC_FULL.md §4.9).
pub fn encrypt_secret(config: &AppConfig, plain_text: &str) -> Result<String, WarehouseError> {
    let cipher = cipher_for(config);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plain_text.as_bytes())
        .map_err(|e| WarehouseError::Uncategorized(anyhow::anyhow!("secret encryption failed: {e}")))?;
    let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);
    Ok(URL_SAFE_NO_PAD.encode(combined))
}

pub fn decrypt_secret(config: &AppConfig, cipher_text: &str) -> Result<String, WarehouseError> {
    let combined = URL_SAFE_NO_PAD
        .decode(cipher_text)
        .map_err(|e| WarehouseError::Uncategorized(anyhow::anyhow!("secret decoding failed: {e}")))?;
    if combined.len() < NONCE_LEN {
        return Err(WarehouseError::Uncategorized(anyhow::anyhow!(
            "secret ciphertext too short"
        )));
    }
    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
    let cipher = cipher_for(config);
    let plain = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| WarehouseError::Uncategorized(anyhow::anyhow!("secret decryption failed: {e}")))?;
    String::from_utf8(plain)
        .map_err(|e| WarehouseError::Uncategorized(anyhow::anyhow!("secret was not valid utf-8: {e}")))
}

/// First-2 + `*` * (len-4) + last-2, matching the source exactly.
pub fn mask_secret(value: Option<&str>) -> Option<String> {
    let value = value?;
    if value.is_empty() {
        return None;
    }
    if value.len() <= 4 {
        return Some("*".repeat(value.len()));
    }
    let chars: Vec<char> = value.chars().collect();
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    Some(format!("{head}{}{tail}", "*".repeat(chars.len() - 4)))
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
    fn round_trips_a_secret() {
        let config = test_config();
        let cipher_text = encrypt_secret(&config, "sk-super-secret-value").unwrap();
        assert_ne!(cipher_text, "sk-super-secret-value");
        let plain = decrypt_secret(&config, &cipher_text).unwrap();
        assert_eq!(plain, "sk-super-secret-value");
    }

    #[test]
    fn encrypting_twice_yields_different_ciphertext() {
        let config = test_config();
        let a = encrypt_secret(&config, "same-plaintext").unwrap();
        let b = encrypt_secret(&config, "same-plaintext").unwrap();
        assert_ne!(a, b, "random nonce should make each encryption unique");
    }

    #[test]
    fn decrypting_with_the_wrong_key_fails() {
        let mut other = test_config();
        other.jwt_secret = "a-totally-different-secret".to_string();
        let cipher_text = encrypt_secret(&test_config(), "sk-super-secret-value").unwrap();
        assert!(decrypt_secret(&other, &cipher_text).is_err());
    }

    #[test]
    fn masks_long_secrets_with_head_and_tail_visible() {
        assert_eq!(mask_secret(Some("sk-abcdefgh")), Some("sk*******gh".to_string()));
    }

    #[test]
    fn masks_short_secrets_entirely() {
        assert_eq!(mask_secret(Some("ab")), Some("**".to_string()));
        assert_eq!(mask_secret(Some("abcd")), Some("****".to_string()));
    }

    #[test]
    fn masking_none_or_empty_yields_none() {
        assert_eq!(mask_secret(None), None);
        assert_eq!(mask_secret(Some("")), None);
    }
}
