#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for `SqliteStore`: the `DnsAccountRepository`,
//! `ServerRepository` and `DomainRepository` implementations.

use chrono::{DateTime, Duration, TimeZone, Utc};

use doorway_app::adapters::SqliteStore;
use doorway_core::crypto::KeyRing;
use doorway_core::error::CoreError;
use doorway_core::traits::{DnsAccountRepository, DomainRepository, ServerRepository};
use doorway_core::types::{
    DnsAccount, Domain, DomainPatch, DomainStatus, ProviderCredentials, ProviderType, Server,
    TlsStatus, ZoneBinding,
};

// ===== Helpers =====

async fn create_test_store() -> (SqliteStore, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let db_path = tmp.path().join("test.db");
    let store = SqliteStore::new(&db_path)
        .await
        .expect("failed to create SqliteStore");
    (store, tmp)
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
}

fn key_ring() -> KeyRing {
    KeyRing::new("test", [3u8; 32]).unwrap()
}

fn make_account(id: &str, provider: ProviderType) -> DnsAccount {
    let credentials = match provider {
        ProviderType::Cloudflare => ProviderCredentials::Cloudflare {
            api_token: "cf-token".to_string(),
            account_id: None,
        },
        ProviderType::Dnspod => ProviderCredentials::Dnspod {
            secret_id: "AKID".to_string(),
            secret_key: "secret".to_string(),
        },
    };
    DnsAccount {
        id: id.to_string(),
        name: format!("Test Account {id}"),
        provider,
        is_active: true,
        credentials: key_ring().seal_credentials(&credentials).unwrap(),
        last_sync_at: None,
        created_at: at(0),
        updated_at: at(0),
    }
}

fn make_server(id: &str, ip: &str) -> Server {
    Server {
        id: id.to_string(),
        name: format!("web-{id}"),
        ip_address: ip.to_string(),
        is_primary: false,
        created_at: at(0),
        updated_at: at(0),
    }
}

fn make_domain(id: &str, name: &str, account: &DnsAccount, created: i64) -> Domain {
    let mut domain = Domain::provisioned(
        name.to_string(),
        account.id.clone(),
        None,
        ZoneBinding::new(account.provider, format!("zone-{id}")),
        vec!["ns1.example.net".to_string(), "ns2.example.net".to_string()],
    );
    domain.id = id.to_string();
    domain.created_at = at(created);
    domain.updated_at = at(created);
    domain
}

async fn store_with_account(provider: ProviderType) -> (SqliteStore, tempfile::TempDir, DnsAccount) {
    let (store, tmp) = create_test_store().await;
    let account = make_account("acc-1", provider);
    DnsAccountRepository::save(&store, &account).await.unwrap();
    (store, tmp, account)
}

// ===== DnsAccountRepository Tests =====

#[tokio::test]
async fn account_find_all_empty() {
    let (store, _tmp) = create_test_store().await;
    let accounts = DnsAccountRepository::find_all(&store).await.unwrap();
    assert!(accounts.is_empty());
}

#[tokio::test]
async fn account_save_and_find_by_id() {
    let (store, _tmp) = create_test_store().await;
    let account = make_account("acc-1", ProviderType::Dnspod);
    DnsAccountRepository::save(&store, &account).await.unwrap();

    let found = DnsAccountRepository::find_by_id(&store, "acc-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.name, "Test Account acc-1");
    assert_eq!(found.provider, ProviderType::Dnspod);
    assert!(found.is_active);
    assert_eq!(found.created_at, at(0));
    assert_eq!(found.updated_at, at(0));

    // 凭证原样读回，仍可用同一把密钥解开
    let creds = key_ring().open_credentials(&found.credentials).unwrap();
    assert_eq!(creds.provider_type(), ProviderType::Dnspod);
}

#[tokio::test]
async fn account_find_by_id_not_found() {
    let (store, _tmp) = create_test_store().await;
    let found = DnsAccountRepository::find_by_id(&store, "nonexistent")
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn account_save_upsert_updates_existing() {
    let (store, _tmp) = create_test_store().await;
    let mut account = make_account("acc-1", ProviderType::Cloudflare);
    DnsAccountRepository::save(&store, &account).await.unwrap();

    account.name = "Updated Name".to_string();
    account.updated_at = at(60);
    DnsAccountRepository::save(&store, &account).await.unwrap();

    let found = DnsAccountRepository::find_by_id(&store, "acc-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.name, "Updated Name");
    assert_eq!(found.updated_at, at(60));

    let all = DnsAccountRepository::find_all(&store).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn account_find_active_ids_skips_inactive() {
    let (store, _tmp) = create_test_store().await;
    let active = make_account("acc-active", ProviderType::Cloudflare);
    let mut inactive = make_account("acc-inactive", ProviderType::Dnspod);
    inactive.is_active = false;
    DnsAccountRepository::save(&store, &active).await.unwrap();
    DnsAccountRepository::save(&store, &inactive).await.unwrap();

    let ids = store.find_active_ids().await.unwrap();
    assert_eq!(ids, vec!["acc-active".to_string()]);
}

#[tokio::test]
async fn account_set_active_keeps_updated_at() {
    let (store, _tmp, account) = store_with_account(ProviderType::Dnspod).await;

    store.set_active(&account.id, false).await.unwrap();

    let found = DnsAccountRepository::find_by_id(&store, &account.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!found.is_active);
    assert_eq!(found.updated_at, account.updated_at);
    assert!(store.find_active_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn account_set_active_nonexistent_returns_error() {
    let (store, _tmp) = create_test_store().await;
    let result = store.set_active("nonexistent", true).await;
    assert!(matches!(result, Err(CoreError::AccountNotFound(_))));
}

#[tokio::test]
async fn account_touch_last_sync() {
    let (store, _tmp, account) = store_with_account(ProviderType::Cloudflare).await;

    store.touch_last_sync(&account.id, at(300)).await.unwrap();

    let found = DnsAccountRepository::find_by_id(&store, &account.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.last_sync_at, Some(at(300)));
    assert_eq!(found.updated_at, account.updated_at);
}

// ===== ServerRepository Tests =====

#[tokio::test]
async fn server_save_and_find() {
    let (store, _tmp) = create_test_store().await;
    let server = make_server("srv-1", "203.0.113.10");
    ServerRepository::save(&store, &server).await.unwrap();

    let found = ServerRepository::find_by_id(&store, "srv-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, server);
    assert!(store.find_primary().await.unwrap().is_none());
}

#[tokio::test]
async fn server_set_primary_is_exclusive() {
    let (store, _tmp) = create_test_store().await;
    ServerRepository::save(&store, &make_server("srv-1", "203.0.113.10"))
        .await
        .unwrap();
    ServerRepository::save(&store, &make_server("srv-2", "203.0.113.20"))
        .await
        .unwrap();

    store.set_primary("srv-1").await.unwrap();
    assert_eq!(store.find_primary().await.unwrap().unwrap().id, "srv-1");

    store.set_primary("srv-2").await.unwrap();
    let primary = store.find_primary().await.unwrap().unwrap();
    assert_eq!(primary.id, "srv-2");
    assert!(primary.is_primary);

    let first = ServerRepository::find_by_id(&store, "srv-1")
        .await
        .unwrap()
        .unwrap();
    assert!(!first.is_primary);
}

#[tokio::test]
async fn server_save_does_not_touch_primary_flag() {
    let (store, _tmp) = create_test_store().await;
    let mut server = make_server("srv-1", "203.0.113.10");
    ServerRepository::save(&store, &server).await.unwrap();
    store.set_primary("srv-1").await.unwrap();

    server.ip_address = "203.0.113.99".to_string();
    ServerRepository::save(&store, &server).await.unwrap();

    let primary = store.find_primary().await.unwrap().unwrap();
    assert_eq!(primary.ip_address, "203.0.113.99");
}

#[tokio::test]
async fn server_set_primary_unknown_keeps_current() {
    let (store, _tmp) = create_test_store().await;
    ServerRepository::save(&store, &make_server("srv-1", "203.0.113.10"))
        .await
        .unwrap();
    store.set_primary("srv-1").await.unwrap();

    let result = store.set_primary("nonexistent").await;
    assert!(matches!(result, Err(CoreError::ServerNotFound(_))));
    assert_eq!(store.find_primary().await.unwrap().unwrap().id, "srv-1");
}

// ===== DomainRepository Tests =====

#[tokio::test]
async fn domain_insert_and_find_by_id() {
    let (store, _tmp, account) = store_with_account(ProviderType::Dnspod).await;
    let domain = make_domain("dom-1", "example.cn", &account, 0);
    DomainRepository::insert(&store, &domain).await.unwrap();

    let found = DomainRepository::find_by_id(&store, "dom-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, domain);
    assert_eq!(found.status, DomainStatus::DnsConfiguring);
    assert_eq!(
        found.zone,
        Some(ZoneBinding::new(ProviderType::Dnspod, "zone-dom-1"))
    );
}

#[tokio::test]
async fn domain_insert_duplicate_name_is_validation_error() {
    let (store, _tmp, account) = store_with_account(ProviderType::Cloudflare).await;
    DomainRepository::insert(&store, &make_domain("dom-1", "example.com", &account, 0))
        .await
        .unwrap();

    let result =
        DomainRepository::insert(&store, &make_domain("dom-2", "example.com", &account, 1)).await;
    match result {
        Err(CoreError::ValidationError(msg)) => assert!(msg.contains("already exists")),
        other => panic!("expected ValidationError, got {other:?}"),
    }
}

#[tokio::test]
async fn domain_existing_names() {
    let (store, _tmp, account) = store_with_account(ProviderType::Cloudflare).await;
    DomainRepository::insert(&store, &make_domain("dom-1", "a.com", &account, 0))
        .await
        .unwrap();
    DomainRepository::insert(&store, &make_domain("dom-2", "b.com", &account, 1))
        .await
        .unwrap();

    let names = ["a.com", "c.com"].map(String::from);
    let existing = store.existing_names(&names).await.unwrap();
    assert_eq!(existing.len(), 1);
    assert!(existing.contains("a.com"));

    assert!(store.existing_names(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn domain_update_if_status_applies_patch() {
    let (store, _tmp, account) = store_with_account(ProviderType::Dnspod).await;
    let mut domain = make_domain("dom-1", "example.cn", &account, 0);
    domain.error_message = Some("old failure".to_string());
    DomainRepository::insert(&store, &domain).await.unwrap();

    let patch = DomainPatch::checked(at(120))
        .status(DomainStatus::SslPending)
        .ssl_status(TlsStatus::Pending)
        .nameservers(vec!["f1g1ns1.dnspod.net".to_string()])
        .clear_error();
    let applied = store
        .update_if_status("dom-1", DomainStatus::DnsConfiguring, &patch)
        .await
        .unwrap();
    assert!(applied);

    let found = DomainRepository::find_by_id(&store, "dom-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.status, DomainStatus::SslPending);
    assert_eq!(found.ssl_status, TlsStatus::Pending);
    assert_eq!(found.nameservers, vec!["f1g1ns1.dnspod.net".to_string()]);
    assert_eq!(found.error_message, None);
    assert_eq!(found.last_check_at, Some(at(120)));
    assert!(found.updated_at > domain.updated_at);
}

#[tokio::test]
async fn domain_update_if_status_rejects_stale_status() {
    let (store, _tmp, account) = store_with_account(ProviderType::Dnspod).await;
    DomainRepository::insert(&store, &make_domain("dom-1", "example.cn", &account, 0))
        .await
        .unwrap();

    let patch = DomainPatch::checked(at(120)).status(DomainStatus::Active);
    let applied = store
        .update_if_status("dom-1", DomainStatus::SslPending, &patch)
        .await
        .unwrap();
    assert!(!applied);

    let found = DomainRepository::find_by_id(&store, "dom-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.status, DomainStatus::DnsConfiguring);
    assert_eq!(found.last_check_at, None);
}

#[tokio::test]
async fn domain_update_if_status_refuses_backward_transition() {
    let (store, _tmp, account) = store_with_account(ProviderType::Dnspod).await;
    DomainRepository::insert(&store, &make_domain("dom-1", "example.cn", &account, 0))
        .await
        .unwrap();
    for (from, to) in [
        (DomainStatus::DnsConfiguring, DomainStatus::SslPending),
        (DomainStatus::SslPending, DomainStatus::Active),
    ] {
        let patch = DomainPatch::checked(at(60)).status(to);
        assert!(store.update_if_status("dom-1", from, &patch).await.unwrap());
    }

    let back = DomainPatch::checked(at(120)).status(DomainStatus::SslPending);
    let err = store
        .update_if_status("dom-1", DomainStatus::Active, &back)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationError(_)));

    let found = DomainRepository::find_by_id(&store, "dom-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.status, DomainStatus::Active);
    assert_eq!(found.last_check_at, Some(at(60)));
}

#[tokio::test]
async fn domain_update_if_status_unknown_id_returns_false() {
    let (store, _tmp) = create_test_store().await;
    let applied = store
        .update_if_status(
            "nonexistent",
            DomainStatus::DnsConfiguring,
            &DomainPatch::checked(at(0)),
        )
        .await
        .unwrap();
    assert!(!applied);
}

#[tokio::test]
async fn domain_update_if_status_sets_error_message() {
    let (store, _tmp, account) = store_with_account(ProviderType::Dnspod).await;
    DomainRepository::insert(&store, &make_domain("dom-1", "example.cn", &account, 0))
        .await
        .unwrap();

    let patch = DomainPatch::checked(at(60))
        .status(DomainStatus::Error)
        .error("zone was deleted at the provider");
    assert!(
        store
            .update_if_status("dom-1", DomainStatus::DnsConfiguring, &patch)
            .await
            .unwrap()
    );

    let found = DomainRepository::find_by_id(&store, "dom-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.status, DomainStatus::Error);
    assert_eq!(
        found.error_message.as_deref(),
        Some("zone was deleted at the provider")
    );
}

#[tokio::test]
async fn find_reconcilable_orders_never_checked_first() {
    let (store, _tmp, account) = store_with_account(ProviderType::Cloudflare).await;

    let mut checked_late = make_domain("dom-late", "late.com", &account, 0);
    checked_late.last_check_at = Some(at(500));
    let mut checked_early = make_domain("dom-early", "early.com", &account, 1);
    checked_early.last_check_at = Some(at(100));
    let never_new = make_domain("dom-never-new", "never-new.com", &account, 3);
    let never_old = make_domain("dom-never-old", "never-old.com", &account, 2);
    for d in [&checked_late, &checked_early, &never_new, &never_old] {
        DomainRepository::insert(&store, d).await.unwrap();
    }

    let found = store
        .find_reconcilable(&DomainStatus::RECONCILABLE, &[account.id.clone()], 10)
        .await
        .unwrap();
    let ids: Vec<_> = found.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["dom-never-old", "dom-never-new", "dom-early", "dom-late"]);

    let limited = store
        .find_reconcilable(&DomainStatus::RECONCILABLE, &[account.id.clone()], 2)
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].id, "dom-never-old");
}

#[tokio::test]
async fn find_reconcilable_filters_status_account_and_binding() {
    let (store, _tmp, account) = store_with_account(ProviderType::Cloudflare).await;
    let other = make_account("acc-2", ProviderType::Cloudflare);
    DnsAccountRepository::save(&store, &other).await.unwrap();

    let pending_ssl = {
        let mut d = make_domain("dom-ssl", "ssl.com", &account, 0);
        d.status = DomainStatus::SslPending;
        d
    };
    let active = {
        let mut d = make_domain("dom-active", "active.com", &account, 1);
        d.status = DomainStatus::Active;
        d
    };
    let unbound = {
        let mut d = make_domain("dom-unbound", "unbound.com", &account, 2);
        d.zone = None;
        d
    };
    let other_account = make_domain("dom-other", "other.com", &other, 3);
    for d in [&pending_ssl, &active, &unbound, &other_account] {
        DomainRepository::insert(&store, d).await.unwrap();
    }

    let found = store
        .find_reconcilable(&DomainStatus::RECONCILABLE, &[account.id.clone()], 10)
        .await
        .unwrap();
    let ids: Vec<_> = found.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["dom-ssl"]);

    assert!(
        store
            .find_reconcilable(&DomainStatus::RECONCILABLE, &[], 10)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn domain_delete() {
    let (store, _tmp, account) = store_with_account(ProviderType::Dnspod).await;
    DomainRepository::insert(&store, &make_domain("dom-1", "example.cn", &account, 0))
        .await
        .unwrap();

    DomainRepository::delete(&store, "dom-1").await.unwrap();
    assert!(
        DomainRepository::find_by_id(&store, "dom-1")
            .await
            .unwrap()
            .is_none()
    );
    // 名称可以重新使用
    DomainRepository::insert(&store, &make_domain("dom-2", "example.cn", &account, 1))
        .await
        .unwrap();
}

#[tokio::test]
async fn store_reopens_existing_database() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("nested").join("doorway.db");

    {
        let store = SqliteStore::new(&db_path).await.unwrap();
        let account = make_account("acc-1", ProviderType::Dnspod);
        DnsAccountRepository::save(&store, &account).await.unwrap();
        DomainRepository::insert(&store, &make_domain("dom-1", "example.cn", &account, 0))
            .await
            .unwrap();
    }

    let reopened = SqliteStore::new(&db_path).await.unwrap();
    let found = DomainRepository::find_by_id(&reopened, "dom-1")
        .await
        .unwrap();
    assert!(found.is_some());
}
