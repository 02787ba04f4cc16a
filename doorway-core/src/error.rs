//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use doorway_provider::ProviderError;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// DNS account not found
    #[error("DNS account not found: {0}")]
    AccountNotFound(String),

    /// DNS account is deactivated
    #[error("DNS account is inactive: {0}")]
    AccountInactive(String),

    /// Domain not found
    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    /// Server not found
    #[error("Server not found: {0}")]
    ServerNotFound(String),

    /// No server given and none is marked primary
    #[error("No primary server configured")]
    NoPrimaryServer,

    /// The domain's site still has an active deployment
    #[error("Domain is in use by an active deployment: {0}")]
    DomainInUse(String),

    /// Credential encryption / decryption error
    #[error("Credential error: {0}")]
    CredentialError(String),

    /// The provider rejected the credentials
    #[error("Invalid credentials for: {0}")]
    InvalidCredentials(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Reverse proxy configuration error
    #[error("Proxy configuration error: {0}")]
    ProxyError(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// A background job ran out of time
    #[error("Job timed out: {0}")]
    Timeout(String),

    /// Provider error (converting from library)
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl CoreError {
    /// Whether it is expected behavior (user input, resource does not exist, etc.), used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::AccountNotFound(_)
            | Self::AccountInactive(_)
            | Self::DomainNotFound(_)
            | Self::ServerNotFound(_)
            | Self::NoPrimaryServer
            | Self::DomainInUse(_)
            | Self::ValidationError(_)
            | Self::InvalidCredentials(_) => true,
            Self::Provider(e) => e.is_expected(),
            _ => false,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
