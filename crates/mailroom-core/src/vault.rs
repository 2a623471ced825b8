// Note: Deprecation warnings from generic-array 0.14.x are expected
// These will be resolved when aes-gcm upgrades to 0.11.0 (currently in RC)
// which uses generic-array 1.x
#![allow(deprecated)]

use aes_gcm::{
    aead::{Aead, KeyInit},
    AeadCore, Aes256Gcm, Nonce,
};
use argon2::Argon2;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use thiserror::Error;

const NONCE_LENGTH: usize = 12;

/// Prefix tagging values encrypted by this vault. Values without it are
/// treated as legacy plaintext and passed through unchanged.
pub const CIPHERTEXT_MARKER: &str = "$MR1$";

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("an explicit encryption key is required in production")]
    MissingKey,

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),
}

/// Encrypts and decrypts small secrets (tenant provider settings) with
/// AES-256-GCM. Ciphertext is self-describing: marker + base64(nonce || ct).
#[derive(Debug, Clone)]
pub struct SecretsVault {
    master_key: Arc<[u8; 32]>,
}

impl SecretsVault {
    /// Creates a vault from an explicit master key.
    /// Accepts either a raw 32-byte key or a hex-encoded 64-character key.
    pub fn new(master_key: &str) -> Result<Self, VaultError> {
        let key_bytes = if master_key.len() == 32 {
            master_key.as_bytes().to_vec()
        } else if master_key.len() == 64 {
            hex::decode(master_key)
                .map_err(|e| VaultError::InvalidKey(format!("invalid hex key: {}", e)))?
        } else {
            return Err(VaultError::InvalidKey(
                "master key must be exactly 32 bytes or 64 hex characters".to_string(),
            ));
        };

        if key_bytes.len() != 32 {
            return Err(VaultError::InvalidKey(
                "master key must be exactly 32 bytes".to_string(),
            ));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&key_bytes);

        Ok(Self {
            master_key: Arc::new(key),
        })
    }

    /// Derives a vault key from a passphrase and salt with Argon2id.
    /// Only meant for non-production environments; see `from_key_material`.
    pub fn derive_from_passphrase(passphrase: &str, salt: &str) -> Result<Self, VaultError> {
        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(passphrase.as_bytes(), salt.as_bytes(), &mut key)
            .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;

        Ok(Self {
            master_key: Arc::new(key),
        })
    }

    /// Applies the startup key policy: an explicit key always wins and must
    /// be well formed; without one, production refuses to start while any
    /// other environment falls back to passphrase derivation.
    pub fn from_key_material(
        explicit_key: Option<&str>,
        passphrase: &str,
        salt: &str,
        production: bool,
    ) -> Result<Self, VaultError> {
        match explicit_key {
            Some(key) if !key.is_empty() => Self::new(key),
            _ if production => Err(VaultError::MissingKey),
            _ => Self::derive_from_passphrase(passphrase, salt),
        }
    }

    /// Returns true if the value carries the vault's ciphertext marker.
    pub fn is_ciphertext(value: &str) -> bool {
        value.starts_with(CIPHERTEXT_MARKER)
    }

    /// Encrypts a plaintext string. Empty input stays empty and input that
    /// is already ciphertext is returned unchanged, so callers can pass
    /// database-loaded values back through without double-encrypting.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        if Self::is_ciphertext(plaintext) {
            return Ok(plaintext.to_string());
        }

        let cipher = Aes256Gcm::new(self.master_key.as_slice().into());
        let nonce = Aes256Gcm::generate_nonce(&mut aes_gcm::aead::OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| VaultError::Encryption(e.to_string()))?;

        let mut combined = nonce.to_vec();
        combined.extend(ciphertext);
        Ok(format!("{}{}", CIPHERTEXT_MARKER, BASE64.encode(combined)))
    }

    /// Decrypts a value produced by `encrypt`. Empty input stays empty and
    /// unmarked input is returned unchanged (legacy plaintext passthrough).
    /// A marked value that fails any decryption stage is an error.
    pub fn decrypt(&self, value: &str) -> Result<String, VaultError> {
        if value.is_empty() {
            return Ok(String::new());
        }

        if !Self::is_ciphertext(value) {
            return Ok(value.to_string());
        }

        let encoded = &value[CIPHERTEXT_MARKER.len()..];
        let data = BASE64
            .decode(encoded)
            .map_err(|e| VaultError::Decryption(format!("base64 decode error: {}", e)))?;

        if data.len() < NONCE_LENGTH {
            return Err(VaultError::Decryption(
                "ciphertext shorter than nonce".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LENGTH);
        let cipher = Aes256Gcm::new(self.master_key.as_slice().into());

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| VaultError::Decryption("invalid ciphertext or wrong key".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| VaultError::Decryption(format!("UTF-8 decode failed: {}", e)))
    }

    /// Generates a random 32-byte key as a hex string (for direct use with `new()`)
    pub fn generate_key() -> String {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        hex::encode(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "12345678901234567890123456789012";

    #[test]
    fn test_new_with_valid_32_byte_key() {
        let vault = SecretsVault::new(TEST_KEY);
        assert!(vault.is_ok());
    }

    #[test]
    fn test_new_with_valid_hex_key() {
        let key = SecretsVault::generate_key();
        assert_eq!(key.len(), 64);
        assert!(SecretsVault::new(&key).is_ok());
    }

    #[test]
    fn test_new_with_invalid_key_length() {
        let result = SecretsVault::new("short");
        assert!(matches!(result, Err(VaultError::InvalidKey(_))));
    }

    #[test]
    fn test_new_with_non_hex_64_char_key() {
        let key = "z".repeat(64);
        let result = SecretsVault::new(&key);
        assert!(matches!(result, Err(VaultError::InvalidKey(_))));
    }

    #[test]
    fn test_key_material_explicit_key_wins() {
        let key = SecretsVault::generate_key();
        let vault = SecretsVault::from_key_material(Some(&key), "pass", "some-salt", true);
        assert!(vault.is_ok());
    }

    #[test]
    fn test_key_material_invalid_explicit_key_fails_fast() {
        let result = SecretsVault::from_key_material(Some("bogus"), "pass", "some-salt", false);
        assert!(matches!(result, Err(VaultError::InvalidKey(_))));
    }

    #[test]
    fn test_key_material_production_without_key_refuses_to_start() {
        let result = SecretsVault::from_key_material(None, "pass", "some-salt", true);
        assert!(matches!(result, Err(VaultError::MissingKey)));

        let result = SecretsVault::from_key_material(Some(""), "pass", "some-salt", true);
        assert!(matches!(result, Err(VaultError::MissingKey)));
    }

    #[test]
    fn test_key_material_derivation_is_deterministic() {
        let vault1 = SecretsVault::from_key_material(None, "pass", "default-salt", false).unwrap();
        let vault2 = SecretsVault::from_key_material(None, "pass", "default-salt", false).unwrap();

        let encrypted = vault1.encrypt("secret").unwrap();
        assert_eq!(vault2.decrypt(&encrypted).unwrap(), "secret");
    }

    #[test]
    fn test_different_passphrases_produce_different_keys() {
        let vault1 = SecretsVault::derive_from_passphrase("pass1", "default-salt").unwrap();
        let vault2 = SecretsVault::derive_from_passphrase("pass2", "default-salt").unwrap();

        let encrypted = vault1.encrypt("secret").unwrap();
        assert!(matches!(
            vault2.decrypt(&encrypted),
            Err(VaultError::Decryption(_))
        ));
    }

    #[test]
    fn test_round_trip() {
        let vault = SecretsVault::new(TEST_KEY).unwrap();

        let original = "Hello, World!";
        let encrypted = vault.encrypt(original).unwrap();
        assert!(SecretsVault::is_ciphertext(&encrypted));
        assert_eq!(vault.decrypt(&encrypted).unwrap(), original);
    }

    #[test]
    fn test_encrypt_is_idempotent_on_ciphertext() {
        let vault = SecretsVault::new(TEST_KEY).unwrap();

        let encrypted = vault.encrypt("secret").unwrap();
        let twice = vault.encrypt(&encrypted).unwrap();
        assert_eq!(encrypted, twice);
        assert_eq!(vault.decrypt(&twice).unwrap(), "secret");
    }

    #[test]
    fn test_encryption_different_each_time() {
        let vault = SecretsVault::new(TEST_KEY).unwrap();

        let encrypted1 = vault.encrypt("secret").unwrap();
        let encrypted2 = vault.encrypt("secret").unwrap();
        // Random nonce per call
        assert_ne!(encrypted1, encrypted2);

        assert_eq!(vault.decrypt(&encrypted1).unwrap(), "secret");
        assert_eq!(vault.decrypt(&encrypted2).unwrap(), "secret");
    }

    #[test]
    fn test_empty_values_collapse_to_empty() {
        let vault = SecretsVault::new(TEST_KEY).unwrap();

        assert_eq!(vault.encrypt("").unwrap(), "");
        assert_eq!(vault.decrypt("").unwrap(), "");
    }

    #[test]
    fn test_legacy_plaintext_passthrough() {
        let vault = SecretsVault::new(TEST_KEY).unwrap();

        let legacy = r#"{"server_token":"stored-before-encryption"}"#;
        assert!(!SecretsVault::is_ciphertext(legacy));
        assert_eq!(vault.decrypt(legacy).unwrap(), legacy);
    }

    #[test]
    fn test_decrypt_corrupted_ciphertext() {
        let vault = SecretsVault::new(TEST_KEY).unwrap();

        let mut encrypted = vault.encrypt("Hello, World!").unwrap();
        encrypted.pop();
        encrypted.push('X');

        let result = vault.decrypt(&encrypted);
        assert!(matches!(result, Err(VaultError::Decryption(_))));
    }

    #[test]
    fn test_decrypt_marked_garbage() {
        let vault = SecretsVault::new(TEST_KEY).unwrap();

        let result = vault.decrypt(&format!("{}not-base64!!", CIPHERTEXT_MARKER));
        assert!(matches!(result, Err(VaultError::Decryption(_))));

        let short = format!("{}{}", CIPHERTEXT_MARKER, BASE64.encode(b"tiny"));
        let result = vault.decrypt(&short);
        assert!(matches!(result, Err(VaultError::Decryption(_))));
    }

    #[test]
    fn test_decrypt_with_wrong_key() {
        let vault1 = SecretsVault::new("12345678901234567890123456789012").unwrap();
        let vault2 = SecretsVault::new("09876543210987654321098765432109").unwrap();

        let encrypted = vault1.encrypt("Hello, World!").unwrap();
        let result = vault2.decrypt(&encrypted);
        assert!(matches!(result, Err(VaultError::Decryption(_))));
    }

    #[test]
    fn test_unicode_round_trip() {
        let vault = SecretsVault::new(TEST_KEY).unwrap();

        let original = "Hello 世界! 🦀 Rust";
        let encrypted = vault.encrypt(original).unwrap();
        assert_eq!(vault.decrypt(&encrypted).unwrap(), original);
    }

    #[test]
    fn test_large_value_round_trip() {
        let vault = SecretsVault::new(TEST_KEY).unwrap();

        let original = "A".repeat(10000);
        let encrypted = vault.encrypt(&original).unwrap();
        assert_eq!(vault.decrypt(&encrypted).unwrap(), original);
    }

    #[test]
    fn test_generated_keys_are_different() {
        let key1 = SecretsVault::generate_key();
        let key2 = SecretsVault::generate_key();
        assert_ne!(key1, key2);
        assert_eq!(key1.len(), 64);
        assert_eq!(key2.len(), 64);
    }

    #[test]
    fn test_is_ciphertext_predicate() {
        assert!(SecretsVault::is_ciphertext("$MR1$abc"));
        assert!(!SecretsVault::is_ciphertext(""));
        assert!(!SecretsVault::is_ciphertext("plaintext"));
        assert!(!SecretsVault::is_ciphertext("MR1$missing-dollar"));
    }
}
