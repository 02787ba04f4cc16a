//! DNS 账户服务
//!
//! Creating, verifying and (de)activating provider accounts. Credentials are
//! sealed with the key ring before they reach the repository.

use std::sync::Arc;

use chrono::Utc;
use doorway_provider::{DnsProvider, ProviderCredentials, create_provider};

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{CreateAccountRequest, DnsAccount};

pub struct AccountService {
    ctx: Arc<ServiceContext>,
}

impl AccountService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    pub async fn list_accounts(&self) -> CoreResult<Vec<DnsAccount>> {
        self.ctx.account_repository.find_all().await
    }

    pub async fn get_account(&self, account_id: &str) -> CoreResult<DnsAccount> {
        self.ctx.get_account(account_id).await
    }

    /// 创建账户
    ///
    /// 流程：验证凭证 -> 加密 -> 注册 Provider -> 保存。
    /// Nothing is stored when the provider rejects the credentials.
    pub async fn create_account(&self, request: CreateAccountRequest) -> CoreResult<DnsAccount> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(CoreError::ValidationError(
                "account name must not be empty".to_string(),
            ));
        }

        let provider = self
            .validate_and_create_provider(&request.credentials)
            .await?;
        self.persist_account(name, &request.credentials, provider)
            .await
    }

    /// Build a provider client and make sure it accepts the credentials.
    pub async fn validate_and_create_provider(
        &self,
        credentials: &ProviderCredentials,
    ) -> CoreResult<Arc<dyn DnsProvider>> {
        let provider = create_provider(credentials.clone())?;
        if !provider.validate_credentials().await? {
            return Err(CoreError::InvalidCredentials(
                credentials.provider_type().to_string(),
            ));
        }
        Ok(provider)
    }

    async fn persist_account(
        &self,
        name: &str,
        credentials: &ProviderCredentials,
        provider: Arc<dyn DnsProvider>,
    ) -> CoreResult<DnsAccount> {
        let now = Utc::now();
        let account = DnsAccount {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            provider: credentials.provider_type(),
            is_active: true,
            credentials: self.ctx.key_ring.seal_credentials(credentials)?,
            last_sync_at: None,
            created_at: now,
            updated_at: now,
        };

        self.ctx
            .provider_registry
            .register(&account, provider)
            .await;

        // 保存失败时清理已注册的 provider
        if let Err(e) = self.ctx.account_repository.save(&account).await {
            log::error!("Failed to save account {}, cleaning up: {e}", account.id);
            self.ctx.provider_registry.unregister(&account.id).await;
            return Err(e);
        }

        log::info!(
            "account_created account_id={} provider={}",
            account.id,
            account.provider
        );
        Ok(account)
    }

    /// Ask the provider whether the stored credentials still work.
    ///
    /// A rejection deactivates the account, an acceptance reactivates it.
    /// Network trouble is returned as an error and leaves the flag alone.
    pub async fn verify_account(&self, account_id: &str) -> CoreResult<bool> {
        let account = self.ctx.get_account(account_id).await?;
        let provider = self.ctx.get_provider(&account).await?;

        match provider.validate_credentials().await {
            Ok(true) => {
                if !account.is_active {
                    self.ctx.account_repository.set_active(account_id, true).await?;
                    log::info!("Account {account_id} reactivated");
                }
                Ok(true)
            }
            Ok(false) => {
                self.ctx
                    .mark_account_invalid(account_id, "凭证验证失败")
                    .await;
                Ok(false)
            }
            Err(e) => Err(self.ctx.handle_provider_error(account_id, e).await),
        }
    }

    pub async fn set_active(&self, account_id: &str, active: bool) -> CoreResult<()> {
        self.ctx.get_account(account_id).await?;
        if !active {
            self.ctx.provider_registry.unregister(account_id).await;
        }
        self.ctx
            .account_repository
            .set_active(account_id, active)
            .await
    }

    /// Re-encrypt credentials still sealed with a retired key.
    ///
    /// Returns how many accounts were rewritten. The plaintext does not
    /// change, so `updated_at` is kept and cached clients stay valid.
    /// An account that cannot be resealed is logged and left as it is.
    pub async fn reseal_credentials(&self) -> CoreResult<usize> {
        let key_ring = &self.ctx.key_ring;
        let mut resealed = 0;

        for account in self.ctx.account_repository.find_all().await? {
            if !key_ring.needs_rotation(&account.credentials) {
                continue;
            }
            let id = account.id.clone();
            match self.reseal_one(account).await {
                Ok(()) => resealed += 1,
                Err(e) => log::error!("Failed to reseal credentials of account {id}: {e}"),
            }
        }

        if resealed > 0 {
            log::info!(
                "credentials_resealed count={resealed} key_id={}",
                key_ring.current_key_id()
            );
        }
        Ok(resealed)
    }

    async fn reseal_one(&self, mut account: DnsAccount) -> CoreResult<()> {
        let key_ring = &self.ctx.key_ring;
        let credentials = key_ring.open_credentials(&account.credentials)?;
        account.credentials = key_ring.seal_credentials(&credentials)?;
        self.ctx.account_repository.save(&account).await
    }
}
