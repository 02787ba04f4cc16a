//! 业务逻辑服务层

mod account_service;
mod provisioning_service;
mod reconciler;
mod reconciliation_job;

pub use account_service::AccountService;
pub use provisioning_service::{ProvisioningConfig, ProvisioningService};
pub use reconciler::{
    FollowUp, Reconciler, Reconciliation, Transition, plan_tls_transition, plan_zone_transition,
};
pub use reconciliation_job::{ReconciliationJob, SweepConfig};

use std::sync::Arc;

use doorway_provider::{DnsProvider, ProviderError, create_provider};

use crate::crypto::KeyRing;
use crate::error::{CoreError, CoreResult};
use crate::traits::{
    CertificateManager, DnsAccountRepository, DomainRepository, ProviderRegistry,
    ServerRepository, SiteDeployments,
};
use crate::types::{DnsAccount, Server};

/// 服务上下文 - 持有所有依赖
///
/// 平台层需要创建此上下文，并注入平台特定的存储实现。
pub struct ServiceContext {
    pub domain_repository: Arc<dyn DomainRepository>,
    pub account_repository: Arc<dyn DnsAccountRepository>,
    pub server_repository: Arc<dyn ServerRepository>,
    /// Provider 注册表
    pub provider_registry: Arc<dyn ProviderRegistry>,
    /// Reverse proxy for providers without edge TLS
    pub certificate_manager: Arc<dyn CertificateManager>,
    pub site_deployments: Arc<dyn SiteDeployments>,
    /// Opens account credentials
    pub key_ring: Arc<KeyRing>,
}

impl ServiceContext {
    /// 获取账户
    pub async fn get_account(&self, account_id: &str) -> CoreResult<DnsAccount> {
        self.account_repository
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))
    }

    /// 获取 Provider 实例
    ///
    /// Uses the cached client when the account is unchanged, otherwise opens
    /// the credentials and builds a new one.
    pub async fn get_provider(&self, account: &DnsAccount) -> CoreResult<Arc<dyn DnsProvider>> {
        if let Some(provider) = self.provider_registry.get(account).await {
            return Ok(provider);
        }

        let credentials = self.key_ring.open_credentials(&account.credentials)?;
        if credentials.provider_type() != account.provider {
            return Err(CoreError::CredentialError(format!(
                "account {} is a {} account but holds {} credentials",
                account.id,
                account.provider,
                credentials.provider_type()
            )));
        }

        let provider = create_provider(credentials)?;
        self.provider_registry
            .register(account, Arc::clone(&provider))
            .await;
        Ok(provider)
    }

    /// Explicit server, or the primary one.
    pub async fn resolve_server(&self, server_id: Option<&str>) -> CoreResult<Server> {
        match server_id {
            Some(id) => self
                .server_repository
                .find_by_id(id)
                .await?
                .ok_or_else(|| CoreError::ServerNotFound(id.to_string())),
            None => self
                .server_repository
                .find_primary()
                .await?
                .ok_or(CoreError::NoPrimaryServer),
        }
    }

    /// 标记账户为无效状态
    ///
    /// 当检测到凭证失效时调用此方法。停用后 sweep 不再选择该账户的域名。
    pub async fn mark_account_invalid(&self, account_id: &str, error_msg: &str) {
        self.provider_registry.unregister(account_id).await;
        if let Err(e) = self.account_repository.set_active(account_id, false).await {
            log::error!("Failed to deactivate account {account_id}: {e}");
            return;
        }
        log::warn!("Account {account_id} deactivated: {error_msg}");
    }

    /// 处理 Provider 错误，如果是凭证失效则停用账户
    pub async fn handle_provider_error(
        &self,
        account_id: &str,
        err: impl Into<CoreError>,
    ) -> CoreError {
        let err = err.into();
        if let CoreError::Provider(ProviderError::InvalidCredentials { .. }) = &err {
            self.mark_account_invalid(account_id, "凭证已失效").await;
        }
        err
    }
}
