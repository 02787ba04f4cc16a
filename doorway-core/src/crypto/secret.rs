//! Encrypted value type

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// An encrypted value as stored in the database.
///
/// Storage form is `{key_id}:{nonce}:{ciphertext}` (base64 parts). Only the
/// ciphertext ever leaves this type; `Debug` does not show it either.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecretField {
    key_id: String,
    nonce: String,
    ciphertext: String,
}

impl SecretField {
    pub(crate) fn new(key_id: String, nonce: String, ciphertext: String) -> Self {
        Self {
            key_id,
            nonce,
            ciphertext,
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub(crate) fn nonce(&self) -> &str {
        &self.nonce
    }

    pub(crate) fn ciphertext(&self) -> &str {
        &self.ciphertext
    }
}

impl fmt::Display for SecretField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.key_id, self.nonce, self.ciphertext)
    }
}

impl fmt::Debug for SecretField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretField")
            .field("key_id", &self.key_id)
            .field("ciphertext", &"<redacted>")
            .finish()
    }
}

impl FromStr for SecretField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key_id), Some(nonce), Some(ciphertext))
                if !key_id.is_empty() && !nonce.is_empty() && !ciphertext.is_empty() =>
            {
                Ok(Self::new(
                    key_id.to_string(),
                    nonce.to_string(),
                    ciphertext.to_string(),
                ))
            }
            _ => Err(CoreError::CredentialError(
                "malformed encrypted value".to_string(),
            )),
        }
    }
}

impl TryFrom<String> for SecretField {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SecretField> for String {
    fn from(value: SecretField) -> Self {
        value.to_string()
    }
}
