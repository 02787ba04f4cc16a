use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::types::{
    DnsRecord, ProviderType, RecordRequest, TlsStatus, ZoneCreated, ZoneDetails, ZoneRef,
};

/// 原始 API 错误（内部使用）
#[derive(Debug, Clone)]
pub(crate) struct RawApiError {
    /// 错误码（各 Provider 格式不同）
    pub code: Option<String>,
    /// 原始错误消息
    pub message: String,
}

impl RawApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// 错误上下文信息（内部使用）
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    /// 记录名称（用于 `RecordExists`）
    pub record_name: Option<String>,
    /// 记录 ID（用于 `RecordNotFound`）
    pub record_id: Option<String>,
    /// 域名（用于 `ZoneExists` / `DomainNotFound`）
    pub domain: Option<String>,
}

impl ErrorContext {
    pub fn domain(name: &str) -> Self {
        Self {
            domain: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn record(zone: &str, name: &str) -> Self {
        Self {
            domain: Some(zone.to_string()),
            record_name: Some(name.to_string()),
            record_id: None,
        }
    }

    pub fn record_id(zone: &str, id: &str) -> Self {
        Self {
            domain: Some(zone.to_string()),
            record_name: None,
            record_id: Some(id.to_string()),
        }
    }
}

/// Provider 错误映射 Trait（内部使用）
/// 各 Provider 实现此 trait 以将原始 API 错误映射到统一错误类型
pub(crate) trait ProviderErrorMapper {
    fn provider_name(&self) -> &'static str;

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    fn parse_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            provider: self.provider_name().to_string(),
            detail: detail.to_string(),
        }
    }

    fn unknown_error(&self, raw: RawApiError) -> ProviderError {
        ProviderError::Unknown {
            provider: self.provider_name().to_string(),
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }
}

/// Zone, record and TLS operations against one DNS provider account.
///
/// Implementations translate their wire formats to the shared types in
/// [`crate::types`]; callers never see provider-specific fields except through
/// `raw_status` / `diagnostic`.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    /// Cheap credential check, used when an account is created or edited.
    ///
    /// Returns `Ok(false)` for rejected credentials; `Err` only for failures
    /// that say nothing about the credentials (network, parse).
    async fn validate_credentials(&self) -> Result<bool>;

    /// Register a new zone.
    ///
    /// A zone that already exists at the provider yields
    /// [`ProviderError::ZoneExists`], never a generic error.
    async fn add_zone(&self, name: &str) -> Result<ZoneCreated>;

    /// Look up a zone visible to these credentials by its domain name.
    async fn find_zone_by_name(&self, name: &str) -> Result<Option<ZoneRef>>;

    /// Current zone status and nameservers.
    async fn get_zone(&self, zone: &ZoneRef) -> Result<ZoneDetails>;

    async fn remove_zone(&self, zone: &ZoneRef) -> Result<()>;

    /// All records of the zone (every page).
    async fn list_records(&self, zone: &ZoneRef) -> Result<Vec<DnsRecord>>;

    /// Create a record without any conflict handling. Returns the record id.
    ///
    /// Callers normally want [`create_record`](Self::create_record).
    async fn insert_record(&self, zone: &ZoneRef, req: &RecordRequest) -> Result<String>;

    async fn update_record(&self, zone: &ZoneRef, record_id: &str, req: &RecordRequest)
    -> Result<()>;

    async fn delete_record(&self, zone: &ZoneRef, record_id: &str) -> Result<()>;

    /// Create a record, treating "already exists" as success.
    ///
    /// On [`ProviderError::RecordExists`] the existing record with the same
    /// type and name is looked up; if its content differs it is updated in
    /// place. Either way its id is returned.
    async fn create_record(&self, zone: &ZoneRef, req: &RecordRequest) -> Result<String> {
        match self.insert_record(zone, req).await {
            Ok(id) => Ok(id),
            Err(conflict @ ProviderError::RecordExists { .. }) => {
                let records = self.list_records(zone).await?;
                let Some(existing) = records.iter().find(|r| req.targets(r)) else {
                    return Err(conflict);
                };
                if !req.is_satisfied_by(existing) {
                    log::info!(
                        "[{}] record {} {:?} in {} exists with different content, updating {}",
                        self.provider_type(),
                        req.name,
                        req.record_type,
                        zone.name,
                        existing.id
                    );
                    self.update_record(zone, &existing.id, req).await?;
                }
                Ok(existing.id.clone())
            }
            Err(e) => Err(e),
        }
    }

    /// Configure edge TLS for the zone.
    ///
    /// Providers without edge TLS leave certificates to a reverse proxy and
    /// report success without doing anything.
    async fn setup_tls(&self, _zone: &ZoneRef) -> Result<bool> {
        Ok(true)
    }

    /// Edge certificate status. [`TlsStatus::None`] for providers without edge TLS.
    async fn get_tls_status(&self, _zone: &ZoneRef) -> Result<TlsStatus> {
        Ok(TlsStatus::None)
    }
}
