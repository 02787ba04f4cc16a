//! 测试辅助模块
//!
//! 提供 mock 实现和便捷的测试工厂方法。

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::time::Instant;

use doorway_provider::{
    DnsProvider, DnsRecord, ProviderCredentials, ProviderError, ProviderType, RecordRequest,
    TlsStatus, ZoneCreated, ZoneDetails, ZoneRef, ZoneStatus,
};

use crate::crypto::{KEY_LENGTH, KeyRing, SecretField};
use crate::error::{CoreError, CoreResult};
use crate::services::{Reconciler, ServiceContext};
use crate::traits::{
    CertificateManager, DnsAccountRepository, DomainRepository, InMemoryProviderRegistry,
    ServerRepository, SiteDeployments,
};
use crate::types::{
    CertificateCheck, DnsAccount, Domain, DomainPatch, DomainStatus, HostChange, Server,
    ZoneBinding,
};

pub const TEST_BACKEND_PORT: u16 = 8080;

// ===== MockDomainRepository =====

#[derive(Default)]
pub struct MockDomainRepository {
    domains: RwLock<HashMap<String, Domain>>,
    /// 如果 Some，insert 时返回此错误（用于测试 cleanup 路径）
    insert_error: RwLock<Option<String>>,
}

impl MockDomainRepository {
    pub async fn set_insert_error(&self, err: Option<String>) {
        *self.insert_error.write().await = err;
    }

    pub async fn all(&self) -> Vec<Domain> {
        self.domains.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl DomainRepository for MockDomainRepository {
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Domain>> {
        Ok(self.domains.read().await.get(id).cloned())
    }

    async fn existing_names(&self, names: &[String]) -> CoreResult<HashSet<String>> {
        let store = self.domains.read().await;
        Ok(store
            .values()
            .filter(|d| names.contains(&d.name))
            .map(|d| d.name.clone())
            .collect())
    }

    async fn insert(&self, domain: &Domain) -> CoreResult<()> {
        if let Some(ref msg) = *self.insert_error.read().await {
            return Err(CoreError::StorageError(msg.clone()));
        }
        let mut store = self.domains.write().await;
        if store.values().any(|d| d.name == domain.name) {
            return Err(CoreError::StorageError(format!(
                "UNIQUE constraint failed: domains.name ({})",
                domain.name
            )));
        }
        store.insert(domain.id.clone(), domain.clone());
        Ok(())
    }

    async fn update_if_status(
        &self,
        id: &str,
        expected: DomainStatus,
        patch: &DomainPatch,
    ) -> CoreResult<bool> {
        patch.check_transition(expected)?;
        let mut store = self.domains.write().await;
        match store.get_mut(id) {
            Some(domain) if domain.status == expected => {
                patch.apply_to(domain);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_reconcilable(
        &self,
        statuses: &[DomainStatus],
        account_ids: &[String],
        limit: usize,
    ) -> CoreResult<Vec<Domain>> {
        let store = self.domains.read().await;
        let mut due: Vec<Domain> = store
            .values()
            .filter(|d| {
                statuses.contains(&d.status)
                    && account_ids.contains(&d.dns_account_id)
                    && d.zone.is_some()
            })
            .cloned()
            .collect();
        // NULLS FIRST
        due.sort_by_key(|d| (d.last_check_at.is_some(), d.last_check_at, d.created_at));
        due.truncate(limit);
        Ok(due)
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        self.domains.write().await.remove(id);
        Ok(())
    }
}

// ===== MockAccountRepository =====

#[derive(Default)]
pub struct MockAccountRepository {
    accounts: RwLock<HashMap<String, DnsAccount>>,
    save_error: RwLock<Option<String>>,
}

impl MockAccountRepository {
    pub async fn set_save_error(&self, err: Option<String>) {
        *self.save_error.write().await = err;
    }
}

#[async_trait]
impl DnsAccountRepository for MockAccountRepository {
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<DnsAccount>> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn find_all(&self) -> CoreResult<Vec<DnsAccount>> {
        Ok(self.accounts.read().await.values().cloned().collect())
    }

    async fn find_active_ids(&self) -> CoreResult<Vec<String>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| a.is_active)
            .map(|a| a.id.clone())
            .collect())
    }

    async fn save(&self, account: &DnsAccount) -> CoreResult<()> {
        if let Some(ref msg) = *self.save_error.read().await {
            return Err(CoreError::StorageError(msg.clone()));
        }
        self.accounts
            .write()
            .await
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    // updated_at 不变：provider 缓存以它为版本号
    async fn set_active(&self, id: &str, active: bool) -> CoreResult<()> {
        match self.accounts.write().await.get_mut(id) {
            Some(account) => {
                account.is_active = active;
                Ok(())
            }
            None => Err(CoreError::AccountNotFound(id.to_string())),
        }
    }

    async fn touch_last_sync(&self, id: &str, at: DateTime<Utc>) -> CoreResult<()> {
        if let Some(account) = self.accounts.write().await.get_mut(id) {
            account.last_sync_at = Some(at);
        }
        Ok(())
    }
}

// ===== MockServerRepository =====

#[derive(Default)]
pub struct MockServerRepository {
    servers: RwLock<HashMap<String, Server>>,
}

#[async_trait]
impl ServerRepository for MockServerRepository {
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Server>> {
        Ok(self.servers.read().await.get(id).cloned())
    }

    async fn find_primary(&self) -> CoreResult<Option<Server>> {
        Ok(self
            .servers
            .read()
            .await
            .values()
            .find(|s| s.is_primary)
            .cloned())
    }

    async fn save(&self, server: &Server) -> CoreResult<()> {
        self.servers
            .write()
            .await
            .insert(server.id.clone(), server.clone());
        Ok(())
    }

    async fn set_primary(&self, id: &str) -> CoreResult<()> {
        let mut store = self.servers.write().await;
        if !store.contains_key(id) {
            return Err(CoreError::ServerNotFound(id.to_string()));
        }
        for server in store.values_mut() {
            server.is_primary = server.id == id;
        }
        Ok(())
    }
}

// ===== MockCertificateManager =====

#[derive(Default)]
struct CertificateState {
    hosts: BTreeMap<String, String>,
    removed: Vec<String>,
    valid: HashSet<String>,
    reload_failure: Option<String>,
}

#[derive(Default)]
pub struct MockCertificateManager {
    state: Mutex<CertificateState>,
}

impl MockCertificateManager {
    /// `(domain, backend)` pairs currently configured.
    pub fn hosts(&self) -> Vec<(String, String)> {
        let state = self.state.lock().unwrap();
        state
            .hosts
            .iter()
            .map(|(d, b)| (d.clone(), b.clone()))
            .collect()
    }

    pub fn removed(&self) -> Vec<String> {
        self.state.lock().unwrap().removed.clone()
    }

    pub fn set_valid(&self, domain: &str, valid: bool) {
        let mut state = self.state.lock().unwrap();
        if valid {
            state.valid.insert(domain.to_string());
        } else {
            state.valid.remove(domain);
        }
    }

    pub fn fail_reloads(&self, reason: &str) {
        self.state.lock().unwrap().reload_failure = Some(reason.to_string());
    }

    fn reload(state: &CertificateState) -> HostChange {
        match &state.reload_failure {
            Some(reason) => HostChange::ReloadFailed {
                reason: reason.clone(),
            },
            None => HostChange::Applied,
        }
    }
}

#[async_trait]
impl CertificateManager for MockCertificateManager {
    async fn add_host(&self, domain: &str, backend: &str) -> CoreResult<HostChange> {
        let mut state = self.state.lock().unwrap();
        state.hosts.insert(domain.to_string(), backend.to_string());
        Ok(Self::reload(&state))
    }

    async fn remove_host(&self, domain: &str) -> CoreResult<HostChange> {
        let mut state = self.state.lock().unwrap();
        state.hosts.remove(domain);
        state.removed.push(domain.to_string());
        Ok(Self::reload(&state))
    }

    async fn check_certificate(&self, domain: &str) -> CoreResult<CertificateCheck> {
        let state = self.state.lock().unwrap();
        if state.valid.contains(domain) {
            Ok(CertificateCheck {
                valid: true,
                issuer: Some("Let's Encrypt".to_string()),
                expires_at: Some(Utc::now() + chrono::Duration::days(90)),
                days_remaining: Some(90),
                error: None,
            })
        } else {
            Ok(CertificateCheck::failed("connection refused"))
        }
    }
}

// ===== MockSiteDeployments =====

#[derive(Default)]
pub struct MockSiteDeployments {
    deployed: RwLock<HashSet<String>>,
}

impl MockSiteDeployments {
    pub async fn deploy(&self, domain_id: &str) {
        self.deployed.write().await.insert(domain_id.to_string());
    }
}

#[async_trait]
impl SiteDeployments for MockSiteDeployments {
    async fn has_active_deployment(&self, domain_id: &str) -> CoreResult<bool> {
        Ok(self.deployed.read().await.contains(domain_id))
    }
}

// ===== MockProvider =====

/// One recorded provider call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub method: &'static str,
    /// Zone name (or domain name for `add_zone`).
    pub target: String,
    pub at: Instant,
}

struct MockZone {
    id: String,
    status: ZoneStatus,
    tls: TlsStatus,
    records: Vec<DnsRecord>,
}

struct ProviderState {
    zones: HashMap<String, MockZone>,
    next_record_id: u64,
    credentials_valid: bool,
    add_zone_errors: HashMap<String, ProviderError>,
    get_zone_errors: HashMap<String, ProviderError>,
    remove_zone_errors: HashMap<String, ProviderError>,
    record_errors: HashMap<String, ProviderError>,
    setup_tls_error: Option<ProviderError>,
    calls: Vec<MockCall>,
}

/// 可编排的 in-memory provider
///
/// Zones live in memory keyed by name; errors can be scripted per name.
pub struct MockProvider {
    provider_type: ProviderType,
    state: Mutex<ProviderState>,
}

impl MockProvider {
    pub fn new(provider_type: ProviderType) -> Self {
        Self {
            provider_type,
            state: Mutex::new(ProviderState {
                zones: HashMap::new(),
                next_record_id: 1,
                credentials_valid: true,
                add_zone_errors: HashMap::new(),
                get_zone_errors: HashMap::new(),
                remove_zone_errors: HashMap::new(),
                record_errors: HashMap::new(),
                setup_tls_error: None,
                calls: Vec::new(),
            }),
        }
    }

    pub fn zone_id(name: &str) -> String {
        format!("zone-{name}")
    }

    fn nameservers(&self) -> Vec<String> {
        match self.provider_type {
            ProviderType::Cloudflare => vec![
                "ada.ns.cloudflare.com".to_string(),
                "bob.ns.cloudflare.com".to_string(),
            ],
            ProviderType::Dnspod => vec![
                "f1g1ns1.dnspod.net".to_string(),
                "f1g1ns2.dnspod.net".to_string(),
            ],
        }
    }

    fn provider_name(&self) -> String {
        self.provider_type.as_str().to_string()
    }

    fn record_call(&self, method: &'static str, target: &str) {
        self.state.lock().unwrap().calls.push(MockCall {
            method,
            target: target.to_string(),
            at: Instant::now(),
        });
    }

    fn not_found(&self, name: &str) -> ProviderError {
        ProviderError::DomainNotFound {
            provider: self.provider_name(),
            domain: name.to_string(),
            raw_message: None,
        }
    }

    /// A zone that already exists at the provider. Returns its ref.
    pub fn add_existing_zone(&self, name: &str) -> ZoneRef {
        let id = Self::zone_id(name);
        self.state.lock().unwrap().zones.insert(
            name.to_string(),
            MockZone {
                id: id.clone(),
                status: ZoneStatus::Pending,
                tls: TlsStatus::None,
                records: Vec::new(),
            },
        );
        ZoneRef::new(id, name)
    }

    pub fn set_zone_status(&self, name: &str, status: ZoneStatus) {
        if let Some(zone) = self.state.lock().unwrap().zones.get_mut(name) {
            zone.status = status;
            return;
        }
        self.add_existing_zone(name);
        self.set_zone_status(name, status);
    }

    pub fn set_tls_status(&self, name: &str, tls: TlsStatus) {
        if let Some(zone) = self.state.lock().unwrap().zones.get_mut(name) {
            zone.tls = tls;
            return;
        }
        self.add_existing_zone(name);
        self.set_tls_status(name, tls);
    }

    pub fn set_credentials_valid(&self, valid: bool) {
        self.state.lock().unwrap().credentials_valid = valid;
    }

    pub fn fail_add_zone(&self, name: &str, err: ProviderError) {
        self.state
            .lock()
            .unwrap()
            .add_zone_errors
            .insert(name.to_string(), err);
    }

    pub fn fail_get_zone(&self, name: &str, err: ProviderError) {
        self.state
            .lock()
            .unwrap()
            .get_zone_errors
            .insert(name.to_string(), err);
    }

    pub fn fail_remove_zone(&self, name: &str, err: ProviderError) {
        self.state
            .lock()
            .unwrap()
            .remove_zone_errors
            .insert(name.to_string(), err);
    }

    /// Record listing and writes in zone `name` fail with `err`.
    pub fn fail_records(&self, name: &str, err: ProviderError) {
        self.state
            .lock()
            .unwrap()
            .record_errors
            .insert(name.to_string(), err);
    }

    pub fn fail_setup_tls(&self, err: ProviderError) {
        self.state.lock().unwrap().setup_tls_error = Some(err);
    }

    pub fn has_zone(&self, name: &str) -> bool {
        self.state.lock().unwrap().zones.contains_key(name)
    }

    pub fn records(&self, name: &str) -> Vec<DnsRecord> {
        self.state
            .lock()
            .unwrap()
            .zones
            .get(name)
            .map(|z| z.records.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self, method: &str) -> Vec<MockCall> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn tls_setups(&self) -> Vec<String> {
        self.calls("setup_tls").into_iter().map(|c| c.target).collect()
    }

    fn record_error(&self, zone: &str) -> Option<ProviderError> {
        self.state.lock().unwrap().record_errors.get(zone).cloned()
    }
}

#[async_trait]
impl DnsProvider for MockProvider {
    fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    async fn validate_credentials(&self) -> doorway_provider::Result<bool> {
        self.record_call("validate_credentials", "");
        Ok(self.state.lock().unwrap().credentials_valid)
    }

    async fn add_zone(&self, name: &str) -> doorway_provider::Result<ZoneCreated> {
        self.record_call("add_zone", name);
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.add_zone_errors.get(name) {
            return Err(err.clone());
        }
        if state.zones.contains_key(name) {
            return Err(ProviderError::ZoneExists {
                provider: self.provider_name(),
                domain: name.to_string(),
                raw_message: Some("zone already exists".to_string()),
            });
        }
        let id = Self::zone_id(name);
        state.zones.insert(
            name.to_string(),
            MockZone {
                id: id.clone(),
                status: ZoneStatus::Pending,
                tls: TlsStatus::None,
                records: Vec::new(),
            },
        );
        Ok(ZoneCreated {
            zone_id: id,
            name: name.to_string(),
            nameservers: self.nameservers(),
            raw_status: "pending".to_string(),
        })
    }

    async fn find_zone_by_name(&self, name: &str) -> doorway_provider::Result<Option<ZoneRef>> {
        self.record_call("find_zone_by_name", name);
        Ok(self
            .state
            .lock()
            .unwrap()
            .zones
            .get(name)
            .map(|z| ZoneRef::new(z.id.clone(), name)))
    }

    async fn get_zone(&self, zone: &ZoneRef) -> doorway_provider::Result<ZoneDetails> {
        self.record_call("get_zone", &zone.name);
        let state = self.state.lock().unwrap();
        if let Some(err) = state.get_zone_errors.get(&zone.name) {
            return Err(err.clone());
        }
        let found = state
            .zones
            .get(&zone.name)
            .ok_or_else(|| self.not_found(&zone.name))?;
        Ok(ZoneDetails {
            id: found.id.clone(),
            name: zone.name.clone(),
            status: found.status,
            nameservers: self.nameservers(),
            raw_status: found.status.to_string(),
            diagnostic: None,
        })
    }

    async fn remove_zone(&self, zone: &ZoneRef) -> doorway_provider::Result<()> {
        self.record_call("remove_zone", &zone.name);
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.remove_zone_errors.get(&zone.name) {
            return Err(err.clone());
        }
        state
            .zones
            .remove(&zone.name)
            .map(|_| ())
            .ok_or_else(|| self.not_found(&zone.name))
    }

    async fn list_records(&self, zone: &ZoneRef) -> doorway_provider::Result<Vec<DnsRecord>> {
        self.record_call("list_records", &zone.name);
        if let Some(err) = self.record_error(&zone.name) {
            return Err(err);
        }
        Ok(self.records(&zone.name))
    }

    async fn insert_record(
        &self,
        zone: &ZoneRef,
        req: &RecordRequest,
    ) -> doorway_provider::Result<String> {
        self.record_call("insert_record", &zone.name);
        if let Some(err) = self.record_error(&zone.name) {
            return Err(err);
        }
        let mut state = self.state.lock().unwrap();
        let id = state.next_record_id.to_string();
        let records = &mut state
            .zones
            .get_mut(&zone.name)
            .ok_or_else(|| self.not_found(&zone.name))?
            .records;
        if records.iter().any(|r| req.targets(r)) {
            return Err(ProviderError::RecordExists {
                provider: self.provider_name(),
                record_name: req.name.clone(),
                raw_message: None,
            });
        }
        records.push(DnsRecord {
            id: id.clone(),
            record_type: req.record_type,
            name: req.name.clone(),
            content: req.content.clone(),
            ttl: req.ttl,
            proxied: req.proxied,
        });
        state.next_record_id += 1;
        Ok(id)
    }

    async fn update_record(
        &self,
        zone: &ZoneRef,
        record_id: &str,
        req: &RecordRequest,
    ) -> doorway_provider::Result<()> {
        self.record_call("update_record", &zone.name);
        if let Some(err) = self.record_error(&zone.name) {
            return Err(err);
        }
        let mut state = self.state.lock().unwrap();
        let record = state
            .zones
            .get_mut(&zone.name)
            .and_then(|z| z.records.iter_mut().find(|r| r.id == record_id))
            .ok_or_else(|| ProviderError::RecordNotFound {
                provider: self.provider_name(),
                record_id: record_id.to_string(),
                raw_message: None,
            })?;
        record.content.clone_from(&req.content);
        record.ttl = req.ttl;
        record.proxied = req.proxied;
        Ok(())
    }

    async fn delete_record(&self, zone: &ZoneRef, record_id: &str) -> doorway_provider::Result<()> {
        self.record_call("delete_record", &zone.name);
        if let Some(z) = self.state.lock().unwrap().zones.get_mut(&zone.name) {
            z.records.retain(|r| r.id != record_id);
        }
        Ok(())
    }

    async fn setup_tls(&self, zone: &ZoneRef) -> doorway_provider::Result<bool> {
        self.record_call("setup_tls", &zone.name);
        match self.state.lock().unwrap().setup_tls_error.clone() {
            Some(err) => Err(err),
            None => Ok(true),
        }
    }

    async fn get_tls_status(&self, zone: &ZoneRef) -> doorway_provider::Result<TlsStatus> {
        self.record_call("get_tls_status", &zone.name);
        let state = self.state.lock().unwrap();
        state
            .zones
            .get(&zone.name)
            .map(|z| z.tls)
            .ok_or_else(|| self.not_found(&zone.name))
    }
}

// ===== 工厂方法 =====

pub fn test_key_ring() -> KeyRing {
    KeyRing::new("test", [7u8; KEY_LENGTH]).unwrap()
}

/// Account with placeholder credentials; pair it with a registered provider.
pub fn account(id: &str, provider: ProviderType) -> DnsAccount {
    let now = Utc::now();
    DnsAccount {
        id: id.to_string(),
        name: format!("{provider} test"),
        provider,
        is_active: true,
        credentials: SecretField::new("test".into(), "bm9uY2U=".into(), "Y3Q=".into()),
        last_sync_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn zone_details(status: ZoneStatus, raw_status: &str, diagnostic: Option<&str>) -> ZoneDetails {
    ZoneDetails {
        id: "zone-1".to_string(),
        name: "example.com".to_string(),
        status,
        nameservers: vec!["ns1.example.net".to_string(), "ns2.example.net".to_string()],
        raw_status: raw_status.to_string(),
        diagnostic: diagnostic.map(str::to_string),
    }
}

/// 测试用 `ServiceContext` 及其 mock 依赖
pub struct TestHarness {
    pub ctx: Arc<ServiceContext>,
    pub domains: Arc<MockDomainRepository>,
    pub accounts: Arc<MockAccountRepository>,
    pub servers: Arc<MockServerRepository>,
    pub certificates: Arc<MockCertificateManager>,
    pub deployments: Arc<MockSiteDeployments>,
    providers: Mutex<HashMap<String, Arc<MockProvider>>>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_key_ring(test_key_ring())
    }

    pub fn with_key_ring(key_ring: KeyRing) -> Self {
        let domains = Arc::new(MockDomainRepository::default());
        let accounts = Arc::new(MockAccountRepository::default());
        let servers = Arc::new(MockServerRepository::default());
        let certificates = Arc::new(MockCertificateManager::default());
        let deployments = Arc::new(MockSiteDeployments::default());

        let ctx = Arc::new(ServiceContext {
            domain_repository: domains.clone(),
            account_repository: accounts.clone(),
            server_repository: servers.clone(),
            provider_registry: Arc::new(InMemoryProviderRegistry::new()),
            certificate_manager: certificates.clone(),
            site_deployments: deployments.clone(),
            key_ring: Arc::new(key_ring),
        });

        Self {
            ctx,
            domains,
            accounts,
            servers,
            certificates,
            deployments,
            providers: Mutex::new(HashMap::new()),
        }
    }

    /// Active account whose provider client is a registered [`MockProvider`].
    pub async fn add_account(&self, provider_type: ProviderType) -> (DnsAccount, Arc<MockProvider>) {
        let acc = account(&uuid::Uuid::new_v4().to_string(), provider_type);
        self.accounts.save(&acc).await.unwrap();

        let provider = Arc::new(MockProvider::new(provider_type));
        self.ctx
            .provider_registry
            .register(&acc, provider.clone())
            .await;
        self.providers
            .lock()
            .unwrap()
            .insert(acc.id.clone(), provider.clone());
        (acc, provider)
    }

    /// Account holding real sealed credentials and no cached client.
    pub async fn add_sealed_account(&self, credentials: ProviderCredentials) -> DnsAccount {
        let mut acc = account(&uuid::Uuid::new_v4().to_string(), credentials.provider_type());
        acc.credentials = self.ctx.key_ring.seal_credentials(&credentials).unwrap();
        self.accounts.save(&acc).await.unwrap();
        acc
    }

    pub async fn add_primary_server(&self, ip: &str) -> Server {
        let server = self.add_server(ip).await;
        self.servers.set_primary(&server.id).await.unwrap();
        Server {
            is_primary: true,
            ..server
        }
    }

    pub async fn add_server(&self, ip: &str) -> Server {
        let server = Server::new(format!("web-{ip}"), ip);
        self.servers.save(&server).await.unwrap();
        server
    }

    /// Domain bound to a zone at the account's provider, stored with `status`.
    pub async fn add_domain(&self, name: &str, account: &DnsAccount, status: DomainStatus) -> Domain {
        let provider = self.providers.lock().unwrap().get(&account.id).cloned();
        let zone_id = match provider {
            Some(provider) => provider.add_existing_zone(name).id,
            None => MockProvider::zone_id(name),
        };

        let mut domain = Domain::provisioned(
            name.to_string(),
            account.id.clone(),
            None,
            ZoneBinding::new(account.provider, zone_id),
            vec![],
        );
        domain.status = status;
        self.domains.insert(&domain).await.unwrap();
        domain
    }

    pub async fn domain(&self, id: &str) -> Domain {
        self.domains.find_by_id(id).await.unwrap().unwrap()
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.ctx.clone(), TEST_BACKEND_PORT)
    }
}
