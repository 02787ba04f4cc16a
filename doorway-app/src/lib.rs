//! Application wiring for doorway.
//!
//! Provides `AppState` (service container), `AppStateBuilder` (adapter
//! injection), the TOML [`config`], and the `SQLite` store in [`adapters`].

pub mod adapters;
pub mod config;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use doorway_core::crypto::KeyRing;
use doorway_core::error::{CoreError, CoreResult};
use doorway_core::scheduler::{JobRunner, Scheduler};
use doorway_core::services::{
    AccountService, ProvisioningConfig, ProvisioningService, ReconciliationJob, ServiceContext,
    SweepConfig,
};
use doorway_core::traits::{
    CertificateManager, DnsAccountRepository, DomainRepository, InMemoryProviderRegistry,
    NoDeployments, ProviderRegistry, ServerRepository, SiteDeployments,
};
use doorway_core::types::BulkResult;

/// Application state shared by the daemon and any front end.
pub struct AppState {
    /// Service context (holds all storage adapters)
    pub ctx: Arc<ServiceContext>,
    pub account_service: Arc<AccountService>,
    pub provisioning_service: Arc<ProvisioningService>,
    pub reconciliation_job: Arc<ReconciliationJob>,
    /// Retry policy for queued bulk operations
    pub job_runner: JobRunner,
    /// Whether startup has completed
    pub startup_completed: AtomicBool,
}

impl AppState {
    /// Startup sequence: move credentials sealed with a retired key to the
    /// current one. Failures are logged; the daemon still starts.
    pub async fn run_startup(&self) {
        match self.account_service.reseal_credentials().await {
            Ok(0) => log::info!("凭证检查：无需重新加密"),
            Ok(count) => log::info!("{count} 个账户的凭证已用当前密钥重新加密"),
            Err(e) => log::error!("Failed to reseal credentials: {e}"),
        }
        self.startup_completed.store(true, Ordering::SeqCst);
    }

    /// Start the recurring reconciliation sweep.
    pub fn spawn_sweep(&self, every: Duration, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let job = Arc::clone(&self.reconciliation_job);
        Scheduler::spawn_recurring(job, every, shutdown)
    }

    /// Queue a bulk add; the caller gets a handle instead of waiting.
    pub fn enqueue_bulk_add(
        &self,
        names: Vec<String>,
        account_id: String,
        server_id: Option<String>,
    ) -> JoinHandle<CoreResult<BulkResult>> {
        let service = Arc::clone(&self.provisioning_service);
        self.job_runner.spawn("bulk_add", move || {
            let service = Arc::clone(&service);
            let names = names.clone();
            let account_id = account_id.clone();
            let server_id = server_id.clone();
            async move {
                service
                    .bulk_add(&names, &account_id, server_id.as_deref())
                    .await
            }
        })
    }

    /// Queue an IP change for many domains.
    pub fn enqueue_update_ip(
        &self,
        domain_ids: Vec<String>,
        new_ip: String,
    ) -> JoinHandle<CoreResult<BulkResult>> {
        let service = Arc::clone(&self.provisioning_service);
        self.job_runner.spawn("update_ip_bulk", move || {
            let service = Arc::clone(&service);
            let domain_ids = domain_ids.clone();
            let new_ip = new_ip.clone();
            async move { service.update_ip_bulk(&domain_ids, &new_ip).await }
        })
    }
}

/// Builder for constructing `AppState` with platform-specific adapters.
///
/// # Required
/// - the three repositories (or [`sqlite_store`](Self::sqlite_store))
/// - `certificate_manager`
/// - `key_ring`
///
/// # Optional
/// - `provider_registry`: defaults to `InMemoryProviderRegistry`
/// - `site_deployments`: defaults to `NoDeployments`
/// - configs and the job runner: their defaults
#[derive(Default)]
pub struct AppStateBuilder {
    domain_repository: Option<Arc<dyn DomainRepository>>,
    account_repository: Option<Arc<dyn DnsAccountRepository>>,
    server_repository: Option<Arc<dyn ServerRepository>>,
    provider_registry: Option<Arc<dyn ProviderRegistry>>,
    certificate_manager: Option<Arc<dyn CertificateManager>>,
    site_deployments: Option<Arc<dyn SiteDeployments>>,
    key_ring: Option<Arc<KeyRing>>,
    provisioning_config: ProvisioningConfig,
    sweep_config: SweepConfig,
    job_runner: JobRunner,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use one `SqliteStore` for all three repositories.
    #[cfg(feature = "sqlite-store")]
    #[must_use]
    pub fn sqlite_store(self, store: Arc<adapters::SqliteStore>) -> Self {
        self.domain_repository(store.clone())
            .account_repository(store.clone())
            .server_repository(store)
    }

    #[must_use]
    pub fn domain_repository(mut self, repo: Arc<dyn DomainRepository>) -> Self {
        self.domain_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn account_repository(mut self, repo: Arc<dyn DnsAccountRepository>) -> Self {
        self.account_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn server_repository(mut self, repo: Arc<dyn ServerRepository>) -> Self {
        self.server_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn provider_registry(mut self, registry: Arc<dyn ProviderRegistry>) -> Self {
        self.provider_registry = Some(registry);
        self
    }

    #[must_use]
    pub fn certificate_manager(mut self, manager: Arc<dyn CertificateManager>) -> Self {
        self.certificate_manager = Some(manager);
        self
    }

    #[must_use]
    pub fn site_deployments(mut self, deployments: Arc<dyn SiteDeployments>) -> Self {
        self.site_deployments = Some(deployments);
        self
    }

    #[must_use]
    pub fn key_ring(mut self, key_ring: KeyRing) -> Self {
        self.key_ring = Some(Arc::new(key_ring));
        self
    }

    #[must_use]
    pub fn provisioning_config(mut self, config: ProvisioningConfig) -> Self {
        self.provisioning_config = config;
        self
    }

    #[must_use]
    pub fn sweep_config(mut self, config: SweepConfig) -> Self {
        self.sweep_config = config;
        self
    }

    #[must_use]
    pub fn job_runner(mut self, runner: JobRunner) -> Self {
        self.job_runner = runner;
        self
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `CoreError::ValidationError` if required adapters are missing.
    pub fn build(self) -> CoreResult<AppState> {
        fn required<T>(value: Option<T>, name: &str) -> CoreResult<T> {
            value.ok_or_else(|| CoreError::ValidationError(format!("{name} is required")))
        }

        let ctx = Arc::new(ServiceContext {
            domain_repository: required(self.domain_repository, "domain_repository")?,
            account_repository: required(self.account_repository, "account_repository")?,
            server_repository: required(self.server_repository, "server_repository")?,
            provider_registry: self
                .provider_registry
                .unwrap_or_else(|| Arc::new(InMemoryProviderRegistry::new())),
            certificate_manager: required(self.certificate_manager, "certificate_manager")?,
            site_deployments: self
                .site_deployments
                .unwrap_or_else(|| Arc::new(NoDeployments)),
            key_ring: required(self.key_ring, "key_ring")?,
        });

        let backend_port = self.provisioning_config.backend_port;
        let account_service = Arc::new(AccountService::new(Arc::clone(&ctx)));
        let provisioning_service = Arc::new(ProvisioningService::new(
            Arc::clone(&ctx),
            self.provisioning_config,
        ));
        let reconciliation_job = Arc::new(ReconciliationJob::new(
            Arc::clone(&ctx),
            self.sweep_config,
            backend_port,
        ));

        Ok(AppState {
            ctx,
            account_service,
            provisioning_service,
            reconciliation_job,
            job_runner: self.job_runner,
            startup_completed: AtomicBool::new(false),
        })
    }
}
