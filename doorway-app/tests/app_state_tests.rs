#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for `AppStateBuilder` and the `AppState` entry points,
//! run against a real `SqliteStore` with a scripted DNS provider.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::watch;

use doorway_app::AppStateBuilder;
use doorway_app::adapters::SqliteStore;
use doorway_core::crypto::KeyRing;
use doorway_core::error::{CoreError, CoreResult};
use doorway_core::scheduler::JobRunner;
use doorway_core::services::{ProvisioningConfig, SweepConfig};
use doorway_core::traits::{
    CertificateManager, DnsAccountRepository, DomainRepository, InMemoryProviderRegistry,
    ProviderRegistry, ServerRepository,
};
use doorway_core::types::{
    CertificateCheck, DnsAccount, DomainStatus, HostChange, ProviderCredentials, ProviderType,
    Server, TlsStatus,
};
use doorway_provider::{
    DnsProvider, DnsRecord, DnsRecordType, RecordRequest, ZoneCreated, ZoneDetails, ZoneRef,
    ZoneStatus,
};

const NAMESERVERS: [&str; 2] = ["f1g1ns1.dnspod.net", "f1g1ns2.dnspod.net"];

// ===== Scripted provider =====

/// `DNSPod`-like provider: every zone is created pending, `activate` flips
/// it to active.
#[derive(Default)]
struct ScriptedDnspod {
    zones: Mutex<Vec<String>>,
    active: Mutex<Vec<String>>,
    records: Mutex<Vec<(String, RecordRequest)>>,
}

impl ScriptedDnspod {
    fn activate(&self, name: &str) {
        self.active.lock().unwrap().push(name.to_string());
    }

    fn records_for(&self, zone: &str) -> Vec<RecordRequest> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|(z, _)| z == zone)
            .map(|(_, r)| r.clone())
            .collect()
    }
}

fn zone_id(name: &str) -> String {
    format!("dp-{name}")
}

#[async_trait]
impl DnsProvider for ScriptedDnspod {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Dnspod
    }

    async fn validate_credentials(&self) -> doorway_provider::Result<bool> {
        Ok(true)
    }

    async fn add_zone(&self, name: &str) -> doorway_provider::Result<ZoneCreated> {
        self.zones.lock().unwrap().push(name.to_string());
        Ok(ZoneCreated {
            zone_id: zone_id(name),
            name: name.to_string(),
            nameservers: NAMESERVERS.map(String::from).to_vec(),
            raw_status: "ENABLE".to_string(),
        })
    }

    async fn find_zone_by_name(&self, name: &str) -> doorway_provider::Result<Option<ZoneRef>> {
        let known = self.zones.lock().unwrap().iter().any(|z| z == name);
        Ok(known.then(|| ZoneRef::new(zone_id(name), name)))
    }

    async fn get_zone(&self, zone: &ZoneRef) -> doorway_provider::Result<ZoneDetails> {
        let active = self.active.lock().unwrap().contains(&zone.name);
        Ok(ZoneDetails {
            id: zone.id.clone(),
            name: zone.name.clone(),
            status: if active {
                ZoneStatus::Active
            } else {
                ZoneStatus::Pending
            },
            nameservers: NAMESERVERS.map(String::from).to_vec(),
            raw_status: "ENABLE".to_string(),
            diagnostic: (!active).then(|| "DNSERROR".to_string()),
        })
    }

    async fn remove_zone(&self, zone: &ZoneRef) -> doorway_provider::Result<()> {
        self.zones.lock().unwrap().retain(|z| *z != zone.name);
        Ok(())
    }

    async fn list_records(&self, zone: &ZoneRef) -> doorway_provider::Result<Vec<DnsRecord>> {
        Ok(self
            .records_for(&zone.name)
            .into_iter()
            .enumerate()
            .map(|(i, r)| DnsRecord {
                id: format!("rec-{i}"),
                record_type: r.record_type,
                name: r.name,
                content: r.content,
                ttl: r.ttl,
                proxied: r.proxied,
            })
            .collect())
    }

    async fn insert_record(
        &self,
        zone: &ZoneRef,
        req: &RecordRequest,
    ) -> doorway_provider::Result<String> {
        let mut records = self.records.lock().unwrap();
        records.push((zone.name.clone(), req.clone()));
        Ok(format!("rec-{}", records.len() - 1))
    }

    async fn update_record(
        &self,
        zone: &ZoneRef,
        record_id: &str,
        req: &RecordRequest,
    ) -> doorway_provider::Result<()> {
        let index: usize = record_id.trim_start_matches("rec-").parse().unwrap();
        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .filter(|(z, _)| *z == zone.name)
            .nth(index)
            .unwrap();
        slot.1 = req.clone();
        Ok(())
    }

    async fn delete_record(&self, _zone: &ZoneRef, _record_id: &str) -> doorway_provider::Result<()> {
        Ok(())
    }
}

// ===== Recording certificate manager =====

#[derive(Default)]
struct RecordingCaddy {
    hosts: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl CertificateManager for RecordingCaddy {
    async fn add_host(&self, domain: &str, backend: &str) -> CoreResult<HostChange> {
        self.hosts
            .lock()
            .unwrap()
            .push((domain.to_string(), backend.to_string()));
        Ok(HostChange::Applied)
    }

    async fn remove_host(&self, domain: &str) -> CoreResult<HostChange> {
        self.hosts.lock().unwrap().retain(|(d, _)| d != domain);
        Ok(HostChange::Applied)
    }

    async fn check_certificate(&self, domain: &str) -> CoreResult<CertificateCheck> {
        let served = self.hosts.lock().unwrap().iter().any(|(d, _)| d == domain);
        if served {
            Ok(CertificateCheck {
                valid: true,
                issuer: Some("Let's Encrypt".to_string()),
                days_remaining: Some(89),
                ..CertificateCheck::default()
            })
        } else {
            Ok(CertificateCheck::failed("connection refused"))
        }
    }
}

// ===== Fixture =====

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

fn key_ring() -> KeyRing {
    KeyRing::new("test", [9u8; 32]).unwrap()
}

struct Fixture {
    store: Arc<SqliteStore>,
    provider: Arc<ScriptedDnspod>,
    caddy: Arc<RecordingCaddy>,
    account: DnsAccount,
    _tmp: tempfile::TempDir,
}

async fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let store = Arc::new(
        SqliteStore::new(&tmp.path().join("doorway.db"))
            .await
            .expect("failed to create SqliteStore"),
    );

    let credentials = ProviderCredentials::Dnspod {
        secret_id: "AKID".to_string(),
        secret_key: "secret".to_string(),
    };
    let account = DnsAccount {
        id: "acc-dnspod".to_string(),
        name: "DNSPod".to_string(),
        provider: ProviderType::Dnspod,
        is_active: true,
        credentials: key_ring().seal_credentials(&credentials).unwrap(),
        last_sync_at: None,
        created_at: fixed_time(),
        updated_at: fixed_time(),
    };
    DnsAccountRepository::save(store.as_ref(), &account)
        .await
        .unwrap();

    let server = Server {
        id: "srv-1".to_string(),
        name: "web-1".to_string(),
        ip_address: "203.0.113.10".to_string(),
        is_primary: false,
        created_at: fixed_time(),
        updated_at: fixed_time(),
    };
    ServerRepository::save(store.as_ref(), &server).await.unwrap();
    store.set_primary("srv-1").await.unwrap();

    Fixture {
        store,
        provider: Arc::new(ScriptedDnspod::default()),
        caddy: Arc::new(RecordingCaddy::default()),
        account,
        _tmp: tmp,
    }
}

impl Fixture {
    async fn builder(&self) -> AppStateBuilder {
        let registry = Arc::new(InMemoryProviderRegistry::new());
        registry.register(&self.account, self.provider.clone()).await;

        AppStateBuilder::new()
            .sqlite_store(self.store.clone())
            .provider_registry(registry)
            .certificate_manager(self.caddy.clone())
            .key_ring(key_ring())
            .provisioning_config(ProvisioningConfig {
                provider_call_delay: Duration::ZERO,
                ..ProvisioningConfig::default()
            })
            .sweep_config(SweepConfig {
                domain_delay: Duration::ZERO,
                ..SweepConfig::default()
            })
            .job_runner(JobRunner {
                max_retries: 1,
                attempt_timeout: Duration::from_secs(30),
                retry_delay: Duration::ZERO,
            })
    }
}

// ===== Builder =====

#[tokio::test]
async fn build_without_repositories_fails() {
    let result = AppStateBuilder::new()
        .certificate_manager(Arc::new(RecordingCaddy::default()))
        .key_ring(key_ring())
        .build();
    match result {
        Err(CoreError::ValidationError(msg)) => assert!(msg.contains("domain_repository")),
        Err(other) => panic!("expected ValidationError, got {other:?}"),
        Ok(_) => panic!("expected an error"),
    }
}

#[tokio::test]
async fn build_without_key_ring_fails() {
    let fx = fixture().await;
    let result = AppStateBuilder::new()
        .sqlite_store(fx.store.clone())
        .certificate_manager(fx.caddy.clone())
        .build();
    match result {
        Err(CoreError::ValidationError(msg)) => assert!(msg.contains("key_ring")),
        Err(other) => panic!("expected ValidationError, got {other:?}"),
        Ok(_) => panic!("expected an error"),
    }
}

#[tokio::test]
async fn run_startup_marks_completion() {
    let fx = fixture().await;
    let state = fx.builder().await.build().unwrap();
    assert!(!state.startup_completed.load(Ordering::SeqCst));

    state.run_startup().await;
    assert!(state.startup_completed.load(Ordering::SeqCst));
}

// ===== End to end =====

#[tokio::test]
async fn domain_goes_from_bulk_add_to_active() {
    let fx = fixture().await;
    let state = fx.builder().await.build().unwrap();

    let result = state
        .enqueue_bulk_add(
            vec!["Example.CN.".to_string(), "bad..name".to_string()],
            fx.account.id.clone(),
            None,
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.success.len(), 1);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].error, "invalid domain name");

    let domain_id = result.success[0].domain_id.clone();
    let domain = DomainRepository::find_by_id(fx.store.as_ref(), &domain_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(domain.name, "example.cn");
    assert_eq!(domain.status, DomainStatus::DnsConfiguring);
    assert_eq!(domain.server_id.as_deref(), Some("srv-1"));
    assert_eq!(domain.nameservers, NAMESERVERS.map(String::from).to_vec());

    let records = fx.provider.records_for("example.cn");
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.content == "203.0.113.10" && r.ttl >= 600));

    let account = DnsAccountRepository::find_by_id(fx.store.as_ref(), &fx.account.id)
        .await
        .unwrap()
        .unwrap();
    assert!(account.last_sync_at.is_some());

    // 委派尚未生效
    let summary = state.reconciliation_job.run_once().await.unwrap();
    assert_eq!(summary.checked, 1);
    assert_eq!(summary.activated, 0);

    fx.provider.activate("example.cn");
    let summary = state.reconciliation_job.run_once().await.unwrap();
    assert_eq!(summary.activated, 1);

    let domain = DomainRepository::find_by_id(fx.store.as_ref(), &domain_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(domain.status, DomainStatus::SslPending);
    assert_eq!(domain.ssl_status, TlsStatus::Pending);
    assert_eq!(
        fx.caddy.hosts.lock().unwrap().clone(),
        vec![("example.cn".to_string(), "203.0.113.10:8080".to_string())]
    );

    let tls = state
        .provisioning_service
        .check_tls_status(&domain_id)
        .await
        .unwrap();
    assert_eq!(tls, TlsStatus::Active);

    let domain = DomainRepository::find_by_id(fx.store.as_ref(), &domain_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(domain.status, DomainStatus::Active);
    assert_eq!(domain.ssl_status, TlsStatus::Active);
}

#[tokio::test]
async fn bulk_add_rejects_names_already_stored() {
    let fx = fixture().await;
    let state = fx.builder().await.build().unwrap();

    let first = state
        .enqueue_bulk_add(vec!["example.cn".to_string()], fx.account.id.clone(), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.success.len(), 1);

    let second = state
        .enqueue_bulk_add(vec!["example.cn".to_string()], fx.account.id.clone(), None)
        .await
        .unwrap()
        .unwrap();
    assert!(second.success.is_empty());
    assert_eq!(second.failed[0].error, "domain already exists");
    assert_eq!(fx.provider.zones.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn enqueue_with_unknown_account_fails_without_retry() {
    let fx = fixture().await;
    let state = fx.builder().await.build().unwrap();

    let result = state
        .enqueue_bulk_add(vec!["example.cn".to_string()], "missing".to_string(), None)
        .await
        .unwrap();
    assert!(matches!(result, Err(CoreError::AccountNotFound(_))));
    assert!(fx.provider.zones.lock().unwrap().is_empty());
}

#[tokio::test]
async fn enqueue_update_ip_moves_a_records() {
    let fx = fixture().await;
    let state = fx.builder().await.build().unwrap();

    let added = state
        .enqueue_bulk_add(vec!["example.cn".to_string()], fx.account.id.clone(), None)
        .await
        .unwrap()
        .unwrap();
    let domain_id = added.success[0].domain_id.clone();

    let moved = state
        .enqueue_update_ip(vec![domain_id, "missing".to_string()], "198.51.100.7".to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.success.len(), 1);
    assert_eq!(moved.failed.len(), 1);

    let records = fx.provider.records_for("example.cn");
    assert!(!records.is_empty());
    assert!(
        records
            .iter()
            .filter(|r| r.record_type == DnsRecordType::A)
            .all(|r| r.content == "198.51.100.7")
    );
}

#[tokio::test]
async fn enqueue_update_ip_rejects_invalid_address() {
    let fx = fixture().await;
    let state = fx.builder().await.build().unwrap();

    let result = state
        .enqueue_update_ip(vec!["any".to_string()], "not-an-ip".to_string())
        .await
        .unwrap();
    assert!(matches!(result, Err(CoreError::ValidationError(_))));
}

#[tokio::test]
async fn sweep_stops_on_shutdown() {
    let fx = fixture().await;
    let state = fx.builder().await.build().unwrap();

    let (tx, rx) = watch::channel(false);
    let handle = state.spawn_sweep(Duration::from_secs(3600), rx);
    tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("sweep did not stop")
        .unwrap();
}
