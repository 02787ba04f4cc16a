//! Domain provisioning
//!
//! Bulk onboarding of domains onto a DNS account, IP moves, removal and
//! operator-triggered rechecks. Multi-domain operations never fail as a
//! whole once their preconditions hold: each domain ends up in either the
//! `success` or the `failed` list of the [`BulkResult`].

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use doorway_provider::{DnsProvider, DnsRecordType, ProviderError, RecordRequest, TlsStatus, ZoneRef};

use crate::error::{CoreError, CoreResult};
use crate::services::{Reconciler, ServiceContext};
use crate::types::{
    BulkResult, DnsAccount, Domain, DomainPatch, DomainStatus, HostChange, RecheckResult,
    RemovalOutcome, Server, ZoneBinding, is_valid_domain_name, normalize_domain_name,
};

/// Tunables for [`ProvisioningService`].
#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
    /// Pause between consecutive provider calls in a batch.
    pub provider_call_delay: Duration,
    /// Requested TTL for `@` / `www`, raised to the provider minimum.
    pub record_ttl: u32,
    /// Port the site server listens on behind the reverse proxy.
    pub backend_port: u16,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            provider_call_delay: Duration::from_millis(500),
            record_ttl: 600,
            backend_port: 8080,
        }
    }
}

/// A domain that made it through provisioning, possibly with warnings.
struct Provisioned {
    domain_id: String,
    warnings: Vec<String>,
}

pub struct ProvisioningService {
    ctx: Arc<ServiceContext>,
    config: ProvisioningConfig,
    reconciler: Reconciler,
}

impl ProvisioningService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>, config: ProvisioningConfig) -> Self {
        let reconciler = Reconciler::new(Arc::clone(&ctx), config.backend_port);
        Self {
            ctx,
            config,
            reconciler,
        }
    }

    pub async fn get_domain(&self, domain_id: &str) -> CoreResult<Domain> {
        self.ctx
            .domain_repository
            .find_by_id(domain_id)
            .await?
            .ok_or_else(|| CoreError::DomainNotFound(domain_id.to_string()))
    }

    // ===== 批量添加 =====

    /// Create zones for `names` on one DNS account and point them at a server.
    ///
    /// Fails as a whole only when the account, server or provider client is
    /// unavailable, before any provider call. Names are then processed in
    /// submission order; a name repeated in the batch is rejected as
    /// "duplicate in batch" after its first occurrence.
    pub async fn bulk_add(
        &self,
        names: &[String],
        account_id: &str,
        server_id: Option<&str>,
    ) -> CoreResult<BulkResult> {
        let account = self.ctx.get_account(account_id).await?;
        if !account.is_active {
            return Err(CoreError::AccountInactive(account_id.to_string()));
        }
        let server = self.ctx.resolve_server(server_id).await?;
        let provider = self.ctx.get_provider(&account).await?;

        let mut result = BulkResult::default();
        let candidates = self.screen_names(names, &mut result).await?;

        let mut persisted = 0usize;
        for (i, name) in candidates.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.provider_call_delay).await;
            }

            match self
                .provision(&account, &server, provider.as_ref(), &name)
                .await
            {
                Ok(done) => {
                    persisted += 1;
                    result.succeed(name, done.domain_id, done.warnings);
                }
                Err(e) => {
                    let e = self.ctx.handle_provider_error(&account.id, e).await;
                    if e.is_expected() {
                        log::warn!("[bulk_add] {name}: {e}");
                    } else {
                        log::error!("[bulk_add] {name}: {e}");
                    }
                    result.fail(name, e.to_string());
                }
            }
        }

        if persisted > 0 {
            if let Err(e) = self
                .ctx
                .account_repository
                .touch_last_sync(&account.id, Utc::now())
                .await
            {
                log::error!("Failed to update last sync of account {}: {e}", account.id);
            }
        }

        log::info!(
            "bulk_add account={} requested={} succeeded={} failed={}",
            account.id,
            names.len(),
            result.success.len(),
            result.failed.len()
        );
        Ok(result)
    }

    /// Normalize and reject what can be rejected without calling the provider.
    async fn screen_names(&self, names: &[String], result: &mut BulkResult) -> CoreResult<Vec<String>> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for raw in names {
            let name = normalize_domain_name(raw);
            if name.is_empty() {
                continue;
            }
            if !is_valid_domain_name(&name) {
                result.fail(raw.trim(), "invalid domain name");
                continue;
            }
            if !seen.insert(name.clone()) {
                result.fail(raw.trim(), "duplicate in batch");
                continue;
            }
            candidates.push(name);
        }

        let existing = self
            .ctx
            .domain_repository
            .existing_names(&candidates)
            .await?;
        candidates.retain(|name| {
            if existing.contains(name) {
                result.fail(name.clone(), "domain already exists");
                false
            } else {
                true
            }
        });
        Ok(candidates)
    }

    async fn provision(
        &self,
        account: &DnsAccount,
        server: &Server,
        provider: &dyn DnsProvider,
        name: &str,
    ) -> CoreResult<Provisioned> {
        let mut warnings = Vec::new();

        let (zone, nameservers, created_here) = match provider.add_zone(name).await {
            Ok(created) => (created.zone_ref(), created.nameservers, true),
            Err(exists @ ProviderError::ZoneExists { .. }) => {
                let Some(zone) = provider.find_zone_by_name(name).await? else {
                    // 区域属于其他账号
                    return Err(exists.into());
                };
                log::warn!("[bulk_add] {name}: zone {} already exists, adopting it", zone.id);
                warnings.push("zone already existed at the provider and was adopted".to_string());
                let nameservers = match provider.get_zone(&zone).await {
                    Ok(details) => details.nameservers,
                    Err(e) => {
                        log::warn!("[bulk_add] {name}: could not read nameservers: {e}");
                        Vec::new()
                    }
                };
                (zone, nameservers, false)
            }
            Err(e) => return Err(e.into()),
        };

        let domain = Domain::provisioned(
            name.to_string(),
            account.id.clone(),
            Some(server.id.clone()),
            ZoneBinding::new(account.provider, zone.id.clone()),
            nameservers,
        );
        if let Err(e) = self.ctx.domain_repository.insert(&domain).await {
            log::error!("Failed to save domain {name}, cleaning up: {e}");
            if created_here {
                if let Err(cleanup_err) = provider.remove_zone(&zone).await {
                    log::warn!("Cleanup: failed to remove zone {} for {name}: {cleanup_err}", zone.id);
                }
            }
            return Err(e);
        }
        log::info!(
            "domain_provisioned domain={name} account={} zone={} adopted={}",
            account.id,
            zone.id,
            !created_here
        );

        warnings.extend(self.point_at_server(provider, &zone, &server.ip_address).await);

        if provider.provider_type().supports_edge_tls() {
            // 状态仍为 dns_configuring，NS 生效前证书不可能签发
            match provider.setup_tls(&zone).await {
                Ok(true) => {}
                Ok(false) => warnings.push("TLS setup was declined by the provider".to_string()),
                Err(e) => {
                    log::warn!("[bulk_add] {name}: TLS setup failed: {e}");
                    warnings.push(format!("TLS setup failed: {e}"));
                }
            }
        }

        Ok(Provisioned {
            domain_id: domain.id,
            warnings,
        })
    }

    /// `@` and `www` A records. Returns one warning per record that failed.
    async fn point_at_server(&self, provider: &dyn DnsProvider, zone: &ZoneRef, ip: &str) -> Vec<String> {
        let provider_type = provider.provider_type();
        // Cloudflare 需要代理记录才能在边缘终止 TLS
        let proxied = provider_type.supports_edge_tls();
        let ttl = provider_type.normalize_ttl(self.config.record_ttl, proxied);

        let mut warnings = Vec::new();
        for host in ["@", "www"] {
            let req = RecordRequest::a(host, ip, ttl, proxied);
            if let Err(e) = provider.create_record(zone, &req).await {
                log::warn!("[records] {} {host} A {ip}: {e}", zone.name);
                warnings.push(format!("{host} A record not created: {e}"));
            }
        }
        warnings
    }

    // ===== 删除 =====

    /// Delete a domain locally, cleaning up the provider zone and proxy host
    /// on a best-effort basis.
    ///
    /// Refuses with [`CoreError::DomainInUse`] while the site has an active
    /// deployment, unless `force` is set. The local row is deleted whatever
    /// happens remotely.
    pub async fn remove_domain(&self, domain_id: &str, force: bool) -> CoreResult<RemovalOutcome> {
        let domain = self.get_domain(domain_id).await?;
        if !force && self.ctx.site_deployments.has_active_deployment(&domain.id).await? {
            return Err(CoreError::DomainInUse(domain.name));
        }

        let outcome = self.cleanup_remote(&domain).await;
        self.ctx.domain_repository.delete(&domain.id).await?;

        match &outcome {
            RemovalOutcome::RemoteCleanupFailed { reason } => {
                log::warn!("domain_removed domain={} remote_cleanup=failed reason={reason}", domain.name);
            }
            other => log::info!("domain_removed domain={} outcome={other:?}", domain.name),
        }
        Ok(outcome)
    }

    async fn cleanup_remote(&self, domain: &Domain) -> RemovalOutcome {
        let Some(binding) = &domain.zone else {
            return RemovalOutcome::LocalOnly;
        };
        let account = match self.ctx.account_repository.find_by_id(&domain.dns_account_id).await {
            Ok(Some(account)) => account,
            Ok(None) => return RemovalOutcome::LocalOnly,
            Err(e) => {
                return RemovalOutcome::RemoteCleanupFailed {
                    reason: e.to_string(),
                };
            }
        };
        let provider = match self.ctx.get_provider(&account).await {
            Ok(p) => p,
            Err(e) => {
                let e = self.ctx.handle_provider_error(&account.id, e).await;
                return RemovalOutcome::RemoteCleanupFailed {
                    reason: e.to_string(),
                };
            }
        };

        let mut failures = Vec::new();
        match provider.remove_zone(&binding.zone_ref(&domain.name)).await {
            // 已经不在 provider 上了
            Ok(()) | Err(ProviderError::DomainNotFound { .. }) => {}
            Err(e) => {
                let e = self.ctx.handle_provider_error(&account.id, e).await;
                failures.push(format!("zone removal failed: {e}"));
            }
        }

        if !provider.provider_type().supports_edge_tls() {
            match self.ctx.certificate_manager.remove_host(&domain.name).await {
                Ok(HostChange::Applied) => {}
                Ok(HostChange::ReloadFailed { reason }) => {
                    failures.push(format!("proxy reload failed: {reason}"));
                }
                Err(e) => failures.push(format!("proxy host removal failed: {e}")),
            }
        }

        if failures.is_empty() {
            RemovalOutcome::FullyRemoved
        } else {
            RemovalOutcome::RemoteCleanupFailed {
                reason: failures.join("; "),
            }
        }
    }

    // ===== IP 迁移 =====

    /// Point every `A` record of the given domains at `new_ip`.
    ///
    /// Existing TTL and proxy flags are kept. A domain without any `A`
    /// record gets fresh `@` and `www` records.
    pub async fn update_ip_bulk(&self, domain_ids: &[String], new_ip: &str) -> CoreResult<BulkResult> {
        let ip: Ipv4Addr = new_ip
            .trim()
            .parse()
            .map_err(|_| CoreError::ValidationError(format!("invalid IPv4 address: {new_ip}")))?;
        let ip = ip.to_string();

        let mut result = BulkResult::default();
        for (i, domain_id) in domain_ids.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.provider_call_delay).await;
            }

            let domain = match self.get_domain(domain_id).await {
                Ok(d) => d,
                Err(e) => {
                    log::warn!("[update_ip] {domain_id}: {e}");
                    result.fail(domain_id.clone(), e.to_string());
                    continue;
                }
            };

            match self.update_domain_ip(&domain, &ip).await {
                Ok(warnings) => result.succeed(domain.name, domain.id, warnings),
                Err(e) => {
                    if e.is_expected() {
                        log::warn!("[update_ip] {}: {e}", domain.name);
                    } else {
                        log::error!("[update_ip] {}: {e}", domain.name);
                    }
                    result.fail(domain.name, e.to_string());
                }
            }
        }

        log::info!(
            "update_ip_bulk ip={ip} requested={} succeeded={} failed={}",
            domain_ids.len(),
            result.success.len(),
            result.failed.len()
        );
        Ok(result)
    }

    async fn update_domain_ip(&self, domain: &Domain, ip: &str) -> CoreResult<Vec<String>> {
        let binding = domain
            .zone
            .as_ref()
            .ok_or_else(|| CoreError::ValidationError("domain has no zone binding".to_string()))?;
        let account = self.ctx.get_account(&domain.dns_account_id).await?;
        let provider = self.ctx.get_provider(&account).await?;
        let zone = binding.zone_ref(&domain.name);

        let records = match provider.list_records(&zone).await {
            Ok(records) => records,
            Err(e) => return Err(self.ctx.handle_provider_error(&account.id, e).await),
        };
        let a_records: Vec<_> = records
            .into_iter()
            .filter(|r| r.record_type == DnsRecordType::A)
            .collect();

        if a_records.is_empty() {
            let ttl = account.provider.normalize_ttl(
                self.config.record_ttl,
                account.provider.supports_edge_tls(),
            );
            for host in ["@", "www"] {
                let req = RecordRequest::a(host, ip, ttl, account.provider.supports_edge_tls());
                if let Err(e) = provider.create_record(&zone, &req).await {
                    return Err(self.ctx.handle_provider_error(&account.id, e).await);
                }
            }
            return Ok(vec!["no A records found, created @ and www".to_string()]);
        }

        for record in a_records.iter().filter(|r| r.content != ip) {
            let req = RecordRequest::a(record.name.clone(), ip, record.ttl, record.proxied);
            if let Err(e) = provider.update_record(&zone, &record.id, &req).await {
                return Err(self.ctx.handle_provider_error(&account.id, e).await);
            }
        }
        Ok(Vec::new())
    }

    // ===== TLS / 核对 =====

    /// Current certificate status, stored on the domain.
    ///
    /// An `ssl_pending` domain whose certificate is now active is moved to
    /// `active`; the reconciliation sweep is the only other place that does so.
    pub async fn check_tls_status(&self, domain_id: &str) -> CoreResult<TlsStatus> {
        let domain = self.get_domain(domain_id).await?;
        let binding = domain
            .zone
            .as_ref()
            .ok_or_else(|| CoreError::ValidationError("domain has no zone binding".to_string()))?;
        let account = self.ctx.get_account(&domain.dns_account_id).await?;
        let provider = self.ctx.get_provider(&account).await?;
        let zone = binding.zone_ref(&domain.name);

        let (tls, detail) = match self
            .reconciler
            .current_tls(&domain, provider.as_ref(), &zone)
            .await
        {
            Ok(v) => v,
            Err(e) => return Err(self.ctx.handle_provider_error(&account.id, e).await),
        };

        let mut patch = DomainPatch::checked(Utc::now()).ssl_status(tls);
        match tls {
            TlsStatus::Active if domain.status == DomainStatus::SslPending => {
                patch = patch.status(DomainStatus::Active).clear_error();
            }
            TlsStatus::Error => {
                patch = patch.error(detail.unwrap_or_else(|| "certificate issuance failed".to_string()));
            }
            _ => {}
        }

        let stored = self
            .ctx
            .domain_repository
            .update_if_status(&domain.id, domain.status, &patch)
            .await?;
        if !stored {
            log::info!("[tls] {} changed concurrently, TLS status not stored", domain.name);
        } else if patch.status.is_some() {
            log::info!(
                "domain_transition domain={} from={} to={}",
                domain.name,
                domain.status,
                DomainStatus::Active
            );
        }
        Ok(tls)
    }

    /// Poll the provider for one domain now, the same way the sweep does.
    pub async fn recheck_status(&self, domain_id: &str) -> CoreResult<RecheckResult> {
        let domain = self.get_domain(domain_id).await?;
        let reconciliation = self.reconciler.reconcile(&domain).await;

        // 核对后重新读取；期间被删除则沿用旧值
        let current = self
            .ctx
            .domain_repository
            .find_by_id(domain_id)
            .await?
            .unwrap_or_else(|| domain.clone());

        Ok(RecheckResult {
            domain_id: domain.id,
            name: domain.name,
            previous: domain.status,
            current: current.status,
            ssl_status: current.ssl_status,
            outcome: reconciliation.outcome,
            message: reconciliation.message,
        })
    }

    /// [`recheck_status`](Self::recheck_status) for several domains, spaced
    /// like other batch operations. Unknown ids are skipped.
    pub async fn recheck_bulk(&self, domain_ids: &[String]) -> Vec<RecheckResult> {
        let mut results = Vec::with_capacity(domain_ids.len());
        for (i, domain_id) in domain_ids.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.provider_call_delay).await;
            }
            match self.recheck_status(domain_id).await {
                Ok(result) => results.push(result),
                Err(e) if e.is_expected() => log::warn!("[recheck] skipping {domain_id}: {e}"),
                Err(e) => log::error!("[recheck] skipping {domain_id}: {e}"),
            }
        }
        results
    }
}
