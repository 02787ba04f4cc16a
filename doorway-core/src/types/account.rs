//! DNS 账户相关类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use doorway_provider::{ProviderCredentials, ProviderType};

use crate::crypto::SecretField;

/// DNS 服务商账户
///
/// Credentials stay sealed; only [`KeyRing`](crate::crypto::KeyRing) can open them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsAccount {
    /// 账户 ID (UUID)
    pub id: String,
    pub name: String,
    pub provider: ProviderType,
    /// Inactive accounts are skipped by provisioning and the sweep.
    pub is_active: bool,
    pub credentials: SecretField,
    /// Last time a zone was created through this account.
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 创建账户请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    /// The provider type is taken from the credential variant.
    pub credentials: ProviderCredentials,
}
