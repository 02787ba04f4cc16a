//! Provider registry abstract Trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use doorway_provider::DnsProvider;

use crate::types::DnsAccount;

/// Provider Registry Trait
///
/// Caches one provider client per DNS account. An entry is tied to the
/// account's `updated_at`, so editing the account makes the cached client
/// stale and it is rebuilt from the new credentials on next use.
#[async_trait]
pub trait ProviderRegistry: Send + Sync {
    /// Cached provider for `account`, unless the account changed since.
    async fn get(&self, account: &DnsAccount) -> Option<Arc<dyn DnsProvider>>;

    async fn register(&self, account: &DnsAccount, provider: Arc<dyn DnsProvider>);

    async fn unregister(&self, account_id: &str);
}

struct CachedProvider {
    account_version: DateTime<Utc>,
    provider: Arc<dyn DnsProvider>,
}

/// In-memory Provider registry
#[derive(Clone, Default)]
pub struct InMemoryProviderRegistry {
    providers: Arc<RwLock<HashMap<String, CachedProvider>>>,
}

impl InMemoryProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProviderRegistry for InMemoryProviderRegistry {
    async fn get(&self, account: &DnsAccount) -> Option<Arc<dyn DnsProvider>> {
        self.providers
            .read()
            .await
            .get(&account.id)
            .filter(|cached| cached.account_version == account.updated_at)
            .map(|cached| Arc::clone(&cached.provider))
    }

    async fn register(&self, account: &DnsAccount, provider: Arc<dyn DnsProvider>) {
        self.providers.write().await.insert(
            account.id.clone(),
            CachedProvider {
                account_version: account.updated_at,
                provider,
            },
        );
    }

    async fn unregister(&self, account_id: &str) {
        self.providers.write().await.remove(account_id);
    }
}
