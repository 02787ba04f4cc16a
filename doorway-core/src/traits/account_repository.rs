//! DNS account persistence abstract Trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::types::DnsAccount;

/// DNS 账户仓库 Trait
///
/// Platform implementation: `SqliteStore` (`SeaORM`) in `doorway-app`.
#[async_trait]
pub trait DnsAccountRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<DnsAccount>>;

    async fn find_all(&self) -> CoreResult<Vec<DnsAccount>>;

    /// IDs of accounts with `is_active = true`.
    async fn find_active_ids(&self) -> CoreResult<Vec<String>>;

    /// Save account (new or update)
    async fn save(&self, account: &DnsAccount) -> CoreResult<()>;

    /// Activate or deactivate an account.
    async fn set_active(&self, id: &str, active: bool) -> CoreResult<()>;

    /// Record that zones were created through the account.
    async fn touch_last_sync(&self, id: &str, at: DateTime<Utc>) -> CoreResult<()>;
}
