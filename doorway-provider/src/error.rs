use serde::{Deserialize, Serialize};

/// Unified error type for all DNS provider operations.
///
/// Every variant names the provider that produced it. Variants are
/// serializable so they can be stored next to a failed batch item.
///
/// # Retryable Errors
///
/// [`NetworkError`](Self::NetworkError), [`Timeout`](Self::Timeout) and
/// [`RateLimited`](Self::RateLimited) are transient. The HTTP layer retries
/// them with exponential backoff before surfacing them.
///
/// # Idempotency Conflicts
///
/// [`ZoneExists`](Self::ZoneExists) and [`RecordExists`](Self::RecordExists)
/// are not failures from the caller's point of view: the existing remote
/// object can be looked up and reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// Connection refused, DNS failure, 5xx gateway errors.
    NetworkError { provider: String, detail: String },

    /// The credentials are invalid, expired or revoked.
    InvalidCredentials {
        provider: String,
        raw_message: Option<String>,
    },

    /// The zone is already registered at the provider.
    ZoneExists {
        provider: String,
        domain: String,
        raw_message: Option<String>,
    },

    /// A record with the same name/type already exists.
    RecordExists {
        provider: String,
        record_name: String,
        raw_message: Option<String>,
    },

    RecordNotFound {
        provider: String,
        record_id: String,
        raw_message: Option<String>,
    },

    /// A request parameter was rejected (bad TTL, malformed IP, invalid domain).
    InvalidParameter {
        provider: String,
        param: String,
        detail: String,
    },

    UnsupportedRecordType {
        provider: String,
        record_type: String,
    },

    /// Account resource quota exhausted. Not transient.
    QuotaExceeded {
        provider: String,
        raw_message: Option<String>,
    },

    /// HTTP 429 or the provider's equivalent. Transient.
    RateLimited {
        provider: String,
        /// Seconds to wait, when the API says so.
        retry_after: Option<u64>,
        raw_message: Option<String>,
    },

    Timeout { provider: String, detail: String },

    /// The zone does not exist (or is not visible to these credentials).
    DomainNotFound {
        provider: String,
        domain: String,
        raw_message: Option<String>,
    },

    /// The zone is locked, banned or disabled at the provider.
    DomainLocked {
        provider: String,
        domain: String,
        raw_message: Option<String>,
    },

    /// The credentials are valid but not allowed to do this, including
    /// "domain belongs to another account".
    PermissionDenied {
        provider: String,
        raw_message: Option<String>,
    },

    ParseError { provider: String, detail: String },

    SerializationError { provider: String, detail: String },

    /// Catch-all for error codes not mapped to a specific variant.
    Unknown {
        provider: String,
        raw_code: Option<String>,
        raw_message: String,
    },
}

impl ProviderError {
    /// 是否为预期行为（用户输入、资源不存在等），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    /// **新增变体时请同步更新此方法。**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::ZoneExists { .. }
                | Self::RecordExists { .. }
                | Self::RecordNotFound { .. }
                | Self::InvalidParameter { .. }
                | Self::UnsupportedRecordType { .. }
                | Self::QuotaExceeded { .. }
                | Self::DomainNotFound { .. }
                | Self::DomainLocked { .. }
                | Self::PermissionDenied { .. }
        )
    }

    /// Transient failures worth another attempt later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }

    /// Name of the provider that produced the error.
    pub fn provider(&self) -> &str {
        match self {
            Self::NetworkError { provider, .. }
            | Self::InvalidCredentials { provider, .. }
            | Self::ZoneExists { provider, .. }
            | Self::RecordExists { provider, .. }
            | Self::RecordNotFound { provider, .. }
            | Self::InvalidParameter { provider, .. }
            | Self::UnsupportedRecordType { provider, .. }
            | Self::QuotaExceeded { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::DomainNotFound { provider, .. }
            | Self::DomainLocked { provider, .. }
            | Self::PermissionDenied { provider, .. }
            | Self::ParseError { provider, .. }
            | Self::SerializationError { provider, .. }
            | Self::Unknown { provider, .. } => provider,
        }
    }
}

fn with_raw(f: &mut std::fmt::Formatter<'_>, head: &str, raw: Option<&String>) -> std::fmt::Result {
    match raw {
        Some(msg) => write!(f, "{head}: {msg}"),
        None => f.write_str(head),
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { provider, detail } => {
                write!(f, "[{provider}] Network error: {detail}")
            }
            Self::InvalidCredentials {
                provider,
                raw_message,
            } => with_raw(
                f,
                &format!("[{provider}] Invalid credentials"),
                raw_message.as_ref(),
            ),
            Self::ZoneExists {
                provider,
                domain,
                raw_message,
            } => with_raw(
                f,
                &format!("[{provider}] Zone '{domain}' already exists"),
                raw_message.as_ref(),
            ),
            Self::RecordExists {
                provider,
                record_name,
                ..
            } => write!(f, "[{provider}] Record '{record_name}' already exists"),
            Self::RecordNotFound {
                provider,
                record_id,
                ..
            } => write!(f, "[{provider}] Record '{record_id}' not found"),
            Self::InvalidParameter {
                provider,
                param,
                detail,
            } => write!(f, "[{provider}] Invalid parameter '{param}': {detail}"),
            Self::UnsupportedRecordType {
                provider,
                record_type,
            } => write!(f, "[{provider}] Unsupported record type: {record_type}"),
            Self::QuotaExceeded {
                provider,
                raw_message,
            } => with_raw(
                f,
                &format!("[{provider}] Quota exceeded"),
                raw_message.as_ref(),
            ),
            Self::RateLimited {
                provider,
                retry_after: Some(secs),
                ..
            } => write!(f, "[{provider}] Rate limited (retry after {secs}s)"),
            Self::RateLimited { provider, .. } => write!(f, "[{provider}] Rate limited"),
            Self::Timeout { provider, detail } => {
                write!(f, "[{provider}] Request timeout: {detail}")
            }
            Self::DomainNotFound {
                provider,
                domain,
                raw_message,
            } => with_raw(
                f,
                &format!("[{provider}] Domain '{domain}' not found"),
                raw_message.as_ref(),
            ),
            Self::DomainLocked {
                provider,
                domain,
                raw_message,
            } => with_raw(
                f,
                &format!("[{provider}] Domain '{domain}' is locked"),
                raw_message.as_ref(),
            ),
            Self::PermissionDenied {
                provider,
                raw_message,
            } => with_raw(
                f,
                &format!("[{provider}] Permission denied"),
                raw_message.as_ref(),
            ),
            Self::ParseError { provider, detail } => {
                write!(f, "[{provider}] Parse error: {detail}")
            }
            Self::SerializationError { provider, detail } => {
                write!(f, "[{provider}] Serialization error: {detail}")
            }
            Self::Unknown {
                provider,
                raw_message,
                ..
            } => write!(f, "[{provider}] {raw_message}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;
