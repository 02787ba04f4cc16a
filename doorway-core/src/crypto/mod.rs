//! 凭证加密模块
//!
//! DNS account credentials are stored as AES-256-GCM ciphertext. A [`KeyRing`]
//! holds the current key plus any retired keys still needed to open older
//! values; sealing always uses the current key.

mod secret;

pub use secret::SecretField;

use std::collections::HashMap;
use std::fmt;

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use pbkdf2::pbkdf2_hmac_array;
use rand::RngCore;
use sha2::Sha256;

use doorway_provider::ProviderCredentials;

use crate::error::{CoreError, CoreResult};

/// PBKDF2-HMAC-SHA256 iterations for passphrase-derived keys (OWASP 2023).
const PBKDF2_ITERATIONS: u32 = 600_000;
/// The passphrase must map to the same key on every start, so the salt is fixed.
const PASSPHRASE_SALT: &[u8] = b"doorway-keyring/v1";
const NONCE_LENGTH: usize = 12;
pub const KEY_LENGTH: usize = 32; // AES-256

type Key = [u8; KEY_LENGTH];

/// Encryption keys indexed by key id.
pub struct KeyRing {
    current: String,
    keys: HashMap<String, Key>,
}

impl KeyRing {
    pub fn new(key_id: impl Into<String>, key: Key) -> CoreResult<Self> {
        let key_id = key_id.into();
        validate_key_id(&key_id)?;
        Ok(Self {
            keys: HashMap::from([(key_id.clone(), key)]),
            current: key_id,
        })
    }

    /// Key given as base64 of exactly 32 bytes.
    pub fn from_base64(key_id: impl Into<String>, encoded: &str) -> CoreResult<Self> {
        Self::new(key_id, decode_key(encoded)?)
    }

    /// Key derived from a passphrase.
    pub fn from_passphrase(key_id: impl Into<String>, passphrase: &str) -> CoreResult<Self> {
        if passphrase.is_empty() {
            return Err(CoreError::CredentialError(
                "passphrase must not be empty".to_string(),
            ));
        }
        Self::new(key_id, derive_key(passphrase))
    }

    /// Keep an older key around for opening values sealed before a rotation.
    pub fn with_retired_key(mut self, key_id: impl Into<String>, key: Key) -> CoreResult<Self> {
        let key_id = key_id.into();
        validate_key_id(&key_id)?;
        if key_id == self.current {
            return Err(CoreError::CredentialError(format!(
                "retired key id '{key_id}' collides with the current key"
            )));
        }
        self.keys.insert(key_id, key);
        Ok(self)
    }

    /// [`with_retired_key`](Self::with_retired_key) for a base64-encoded key.
    pub fn with_retired_base64(self, key_id: impl Into<String>, encoded: &str) -> CoreResult<Self> {
        let key = decode_key(encoded)?;
        self.with_retired_key(key_id, key)
    }

    pub fn current_key_id(&self) -> &str {
        &self.current
    }

    pub fn seal(&self, plaintext: &[u8]) -> CoreResult<SecretField> {
        let key = self.key(&self.current)?;
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        rand::rng().fill_bytes(&mut nonce_bytes);

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CoreError::CredentialError(format!("Failed to create cipher: {e}")))?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|e| CoreError::CredentialError(format!("Encryption failed: {e}")))?;

        Ok(SecretField::new(
            self.current.clone(),
            BASE64.encode(nonce_bytes),
            BASE64.encode(ciphertext),
        ))
    }

    pub fn open(&self, secret: &SecretField) -> CoreResult<Vec<u8>> {
        let key = self.key(secret.key_id())?;
        let nonce_bytes = BASE64
            .decode(secret.nonce())
            .map_err(|e| CoreError::CredentialError(format!("Invalid nonce: {e}")))?;
        if nonce_bytes.len() != NONCE_LENGTH {
            return Err(CoreError::CredentialError(format!(
                "Invalid nonce length {}",
                nonce_bytes.len()
            )));
        }
        let ciphertext = BASE64
            .decode(secret.ciphertext())
            .map_err(|e| CoreError::CredentialError(format!("Invalid ciphertext: {e}")))?;

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CoreError::CredentialError(format!("Failed to create cipher: {e}")))?;
        cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| {
                CoreError::CredentialError(
                    "Decryption failed: wrong key or corrupted data".to_string(),
                )
            })
    }

    pub fn seal_credentials(&self, credentials: &ProviderCredentials) -> CoreResult<SecretField> {
        let json = serde_json::to_vec(credentials)
            .map_err(|e| CoreError::SerializationError(e.to_string()))?;
        self.seal(&json)
    }

    pub fn open_credentials(&self, secret: &SecretField) -> CoreResult<ProviderCredentials> {
        let json = self.open(secret)?;
        serde_json::from_slice(&json).map_err(|e| {
            CoreError::CredentialError(format!("Decrypted credentials are malformed: {e}"))
        })
    }

    /// Whether `secret` was sealed with a key other than the current one.
    pub fn needs_rotation(&self, secret: &SecretField) -> bool {
        secret.key_id() != self.current
    }

    fn key(&self, key_id: &str) -> CoreResult<&Key> {
        self.keys
            .get(key_id)
            .ok_or_else(|| CoreError::CredentialError(format!("Unknown encryption key '{key_id}'")))
    }
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.keys.keys().collect();
        ids.sort();
        f.debug_struct("KeyRing")
            .field("current", &self.current)
            .field("key_ids", &ids)
            .finish()
    }
}

fn derive_key(passphrase: &str) -> Key {
    pbkdf2_hmac_array::<Sha256, KEY_LENGTH>(passphrase.as_bytes(), PASSPHRASE_SALT, PBKDF2_ITERATIONS)
}

fn decode_key(encoded: &str) -> CoreResult<Key> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| CoreError::CredentialError(format!("Invalid master key encoding: {e}")))?;
    Key::try_from(bytes.as_slice()).map_err(|_| {
        CoreError::CredentialError(format!(
            "Master key must be {KEY_LENGTH} bytes, got {}",
            bytes.len()
        ))
    })
}

fn validate_key_id(key_id: &str) -> CoreResult<()> {
    if key_id.is_empty() || key_id.contains(':') {
        return Err(CoreError::CredentialError(format!(
            "Invalid key id '{key_id}'"
        )));
    }
    Ok(())
}
