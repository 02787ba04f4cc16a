//! Domain reconciliation
//!
//! One routine advances a domain from what its provider reports. The sweep,
//! operator rechecks and bulk rechecks all go through [`Reconciler::reconcile`].
//!
//! Deciding what to write is pure ([`plan_zone_transition`],
//! [`plan_tls_transition`]); the reconciler only fetches signals, writes the
//! planned patch under a status CAS and runs the follow-up side effect.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use doorway_provider::{DnsProvider, TlsStatus, ZoneDetails, ZoneRef, ZoneStatus};

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{DnsAccount, Domain, DomainPatch, DomainStatus, HostChange, RecheckOutcome};

/// Side effect to run after a transition was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    None,
    /// Ask the DNS provider to issue its edge certificate.
    SetupEdgeTls,
    /// Point the reverse proxy at the domain so it obtains a certificate.
    AddProxyHost,
}

/// What to write for one provider signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub patch: DomainPatch,
    pub outcome: RecheckOutcome,
    pub follow_up: FollowUp,
    pub message: Option<String>,
}

impl Transition {
    fn wait(patch: DomainPatch, message: Option<String>) -> Self {
        Self {
            patch,
            outcome: RecheckOutcome::Unchanged,
            follow_up: FollowUp::None,
            message,
        }
    }
}

/// Plan for a `dns_configuring` domain given its zone.
///
/// Only an explicit `Active` moves the domain forward.
pub fn plan_zone_transition(
    details: &ZoneDetails,
    edge_tls: bool,
    now: DateTime<Utc>,
) -> Transition {
    let mut patch = DomainPatch::checked(now);
    if !details.nameservers.is_empty() {
        patch = patch.nameservers(details.nameservers.clone());
    }

    match details.status {
        ZoneStatus::Active => Transition {
            patch: patch
                .status(DomainStatus::SslPending)
                .ssl_status(TlsStatus::Pending)
                .clear_error(),
            outcome: RecheckOutcome::ZoneActivated,
            follow_up: if edge_tls {
                FollowUp::SetupEdgeTls
            } else {
                FollowUp::AddProxyHost
            },
            message: None,
        },
        ZoneStatus::Pending | ZoneStatus::Initializing => {
            Transition::wait(patch, Some(details.describe()))
        }
        ZoneStatus::Deleted | ZoneStatus::Unknown => {
            let message = details.describe();
            Transition {
                patch: patch.status(DomainStatus::Error).error(message.clone()),
                outcome: RecheckOutcome::Errored,
                follow_up: FollowUp::None,
                message: Some(message),
            }
        }
    }
}

/// Plan for an `ssl_pending` domain given its certificate status.
///
/// A certificate error is recorded but does not end the lifecycle: issuance
/// is retried by the provider or proxy and the domain stays `ssl_pending`.
pub fn plan_tls_transition(tls: TlsStatus, detail: Option<&str>, now: DateTime<Utc>) -> Transition {
    let patch = DomainPatch::checked(now);
    match tls {
        TlsStatus::Active => Transition {
            patch: patch
                .status(DomainStatus::Active)
                .ssl_status(TlsStatus::Active)
                .clear_error(),
            outcome: RecheckOutcome::SslReady,
            follow_up: FollowUp::None,
            message: None,
        },
        TlsStatus::Pending | TlsStatus::None => {
            Transition::wait(patch, detail.map(str::to_string))
        }
        TlsStatus::Error => {
            let message = detail.unwrap_or("certificate issuance failed").to_string();
            Transition {
                patch: patch.ssl_status(TlsStatus::Error).error(message.clone()),
                outcome: RecheckOutcome::TlsFailed,
                follow_up: FollowUp::None,
                message: Some(message),
            }
        }
    }
}

/// Result of reconciling one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub outcome: RecheckOutcome,
    pub message: Option<String>,
}

impl Reconciliation {
    fn skipped(message: impl Into<String>) -> Self {
        Self {
            outcome: RecheckOutcome::Skipped,
            message: Some(message.into()),
        }
    }
}

pub struct Reconciler {
    ctx: Arc<ServiceContext>,
    backend_port: u16,
}

impl Reconciler {
    /// `backend_port` is where the site server listens behind the reverse proxy.
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>, backend_port: u16) -> Self {
        Self { ctx, backend_port }
    }

    /// Poll the provider for `domain` and advance it.
    ///
    /// Never returns an error: failures are reported in the outcome and the
    /// domain's status is left as it was.
    pub async fn reconcile(&self, domain: &Domain) -> Reconciliation {
        if !domain.status.is_reconcilable() {
            return Reconciliation::skipped(format!("status '{}' is not polled", domain.status));
        }
        let Some(binding) = &domain.zone else {
            return Reconciliation::skipped("domain has no zone binding");
        };

        let account = match self.ctx.account_repository.find_by_id(&domain.dns_account_id).await {
            Ok(Some(account)) if account.is_active => account,
            Ok(Some(_)) => return Reconciliation::skipped("DNS account is inactive"),
            Ok(None) => return Reconciliation::skipped("DNS account not found"),
            Err(e) => return self.record_failure(domain, None, e).await,
        };
        if !binding.matches(account.provider) {
            log::error!(
                "[reconcile] {} is bound to {} but account {} is {}",
                domain.name,
                binding.provider_type(),
                account.id,
                account.provider
            );
            return Reconciliation::skipped("zone binding does not match the account provider");
        }

        let provider = match self.ctx.get_provider(&account).await {
            Ok(p) => p,
            Err(e) => return self.record_failure(domain, Some(&account), e).await,
        };
        let zone = binding.zone_ref(&domain.name);

        let now = Utc::now();
        let edge_tls = provider.provider_type().supports_edge_tls();
        let transition = match domain.status {
            DomainStatus::DnsConfiguring => match provider.get_zone(&zone).await {
                Ok(details) => plan_zone_transition(&details, edge_tls, now),
                Err(e) => return self.record_failure(domain, Some(&account), e.into()).await,
            },
            DomainStatus::SslPending => {
                match self.current_tls(domain, provider.as_ref(), &zone).await {
                    Ok((tls, detail)) => {
                        let mut transition = plan_tls_transition(tls, detail.as_deref(), now);
                        // 没有站点配置 Caddy 不会申请证书；证书未就绪时重新写入（覆盖写）
                        if !edge_tls && tls != TlsStatus::Active {
                            transition.follow_up = FollowUp::AddProxyHost;
                        }
                        transition
                    }
                    Err(e) => return self.record_failure(domain, Some(&account), e).await,
                }
            }
            _ => return Reconciliation::skipped("status changed"),
        };

        self.apply(domain, transition, provider.as_ref(), &zone).await
    }

    /// Certificate status for `domain`.
    ///
    /// Edge-TLS providers are asked directly; for the others the certificate
    /// the reverse proxy serves is probed. Returns a detail message when there
    /// is one.
    pub async fn current_tls(
        &self,
        domain: &Domain,
        provider: &dyn DnsProvider,
        zone: &ZoneRef,
    ) -> CoreResult<(TlsStatus, Option<String>)> {
        if provider.provider_type().supports_edge_tls() {
            return Ok((provider.get_tls_status(zone).await?, None));
        }

        let check = self
            .ctx
            .certificate_manager
            .check_certificate(&domain.name)
            .await?;
        if check.valid {
            Ok((TlsStatus::Active, None))
        } else {
            // 代理仍在申请证书，探测失败不算终态
            Ok((TlsStatus::Pending, check.error))
        }
    }

    async fn apply(
        &self,
        domain: &Domain,
        transition: Transition,
        provider: &dyn DnsProvider,
        zone: &ZoneRef,
    ) -> Reconciliation {
        match self
            .ctx
            .domain_repository
            .update_if_status(&domain.id, domain.status, &transition.patch)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                log::info!(
                    "[reconcile] {} changed concurrently, skipping write",
                    domain.name
                );
                return Reconciliation::skipped("status changed concurrently");
            }
            Err(e) => return self.record_failure(domain, None, e).await,
        }

        if let Some(next) = transition.patch.status {
            log::info!(
                "domain_transition domain={} from={} to={}",
                domain.name,
                domain.status,
                next
            );
        }

        let mut message = transition.message;
        if let Some(warning) = self.follow_up(domain, transition.follow_up, provider, zone).await {
            message = Some(warning);
        }

        Reconciliation {
            outcome: transition.outcome,
            message,
        }
    }

    /// Runs after the status write; failures are warnings, never a rollback.
    async fn follow_up(
        &self,
        domain: &Domain,
        follow_up: FollowUp,
        provider: &dyn DnsProvider,
        zone: &ZoneRef,
    ) -> Option<String> {
        match follow_up {
            FollowUp::None => None,
            FollowUp::SetupEdgeTls => match provider.setup_tls(zone).await {
                Ok(true) => None,
                Ok(false) => {
                    log::warn!("[reconcile] {}: provider declined TLS setup", domain.name);
                    Some("TLS setup was declined by the provider".to_string())
                }
                Err(e) => {
                    log::warn!("[reconcile] {}: TLS setup failed: {e}", domain.name);
                    Some(format!("TLS setup failed: {e}"))
                }
            },
            FollowUp::AddProxyHost => {
                let backend = match self.backend_for(domain).await {
                    Ok(backend) => backend,
                    Err(e) => {
                        log::warn!("[reconcile] {}: no proxy backend: {e}", domain.name);
                        return Some(format!("proxy host not added: {e}"));
                    }
                };
                match self
                    .ctx
                    .certificate_manager
                    .add_host(&domain.name, &backend)
                    .await
                {
                    Ok(HostChange::Applied) => None,
                    Ok(HostChange::ReloadFailed { reason }) => {
                        log::warn!("[reconcile] {}: proxy reload failed: {reason}", domain.name);
                        Some(format!("proxy reload failed: {reason}"))
                    }
                    Err(e) => {
                        log::error!("[reconcile] {}: adding proxy host failed: {e}", domain.name);
                        Some(format!("adding proxy host failed: {e}"))
                    }
                }
            }
        }
    }

    /// `{server_ip}:{backend_port}` of the domain's server, or the primary one.
    async fn backend_for(&self, domain: &Domain) -> CoreResult<String> {
        let server = match &domain.server_id {
            Some(id) => match self.ctx.server_repository.find_by_id(id).await? {
                Some(server) => server,
                None => self.ctx.resolve_server(None).await?,
            },
            None => self.ctx.resolve_server(None).await?,
        };
        Ok(format!("{}:{}", server.ip_address, self.backend_port))
    }

    /// Log, bump `last_check_at` so the domain rotates to the back of the
    /// queue, and report. Status is never changed here.
    async fn record_failure(
        &self,
        domain: &Domain,
        account: Option<&DnsAccount>,
        err: CoreError,
    ) -> Reconciliation {
        let err = match account {
            Some(account) => self.ctx.handle_provider_error(&account.id, err).await,
            None => err,
        };
        if err.is_expected() {
            log::warn!("[reconcile] {}: {err}", domain.name);
        } else {
            log::error!("[reconcile] {}: {err}", domain.name);
        }

        if let Err(e) = self
            .ctx
            .domain_repository
            .update_if_status(&domain.id, domain.status, &DomainPatch::checked(Utc::now()))
            .await
        {
            log::error!("[reconcile] {}: failed to record check time: {e}", domain.name);
        }

        Reconciliation {
            outcome: RecheckOutcome::Failed,
            message: Some(err.to_string()),
        }
    }
}
