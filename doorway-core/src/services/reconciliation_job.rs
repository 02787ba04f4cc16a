//! Periodic reconciliation sweep
//!
//! Providers do not notify us when a registrar delegation becomes visible or
//! a certificate is issued, so in-flight domains are re-polled on a schedule.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::CoreResult;
use crate::scheduler::Job;
use crate::services::{Reconciler, ServiceContext};
use crate::types::{DomainStatus, SweepSummary};

/// Tunables for one sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Domains polled per run, oldest check first.
    pub batch_size: usize,
    /// Pause between two domains.
    pub domain_delay: Duration,
    /// Soft wall-clock limit. Checked before each pause and domain, a domain
    /// in flight is never interrupted.
    pub run_budget: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            domain_delay: Duration::from_millis(500),
            run_budget: Duration::from_secs(240),
        }
    }
}

pub struct ReconciliationJob {
    ctx: Arc<ServiceContext>,
    reconciler: Reconciler,
    config: SweepConfig,
}

impl ReconciliationJob {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>, config: SweepConfig, backend_port: u16) -> Self {
        let reconciler = Reconciler::new(Arc::clone(&ctx), backend_port);
        Self {
            ctx,
            reconciler,
            config,
        }
    }

    /// One sweep over the domains that waited longest.
    ///
    /// Only domains of active accounts are selected. Per-domain failures are
    /// counted, never returned; an `Err` means the batch could not be loaded.
    pub async fn run_once(&self) -> CoreResult<SweepSummary> {
        let started = Instant::now();
        let mut summary = SweepSummary::default();

        let account_ids = self.ctx.account_repository.find_active_ids().await?;
        if account_ids.is_empty() {
            log::debug!("reconciliation_sweep skipped: no active accounts");
            return Ok(summary);
        }

        let due = self
            .ctx
            .domain_repository
            .find_reconcilable(&DomainStatus::RECONCILABLE, &account_ids, self.config.batch_size)
            .await?;

        for (i, domain) in due.iter().enumerate() {
            let delay = if i > 0 { self.config.domain_delay } else { Duration::ZERO };
            // 等待之后才会超预算的话，现在就停
            if started.elapsed() + delay >= self.config.run_budget {
                summary.deadline_reached = true;
                log::warn!(
                    "reconciliation_sweep budget of {}s used up, {} domain(s) left for the next run",
                    self.config.run_budget.as_secs(),
                    due.len() - i
                );
                break;
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let result = self.reconciler.reconcile(domain).await;
            log::debug!(
                "[sweep] {} {:?}{}",
                domain.name,
                result.outcome,
                result.message.map(|m| format!(": {m}")).unwrap_or_default()
            );
            summary.record(result.outcome);
        }

        log::info!(
            "reconciliation_sweep checked={} activated={} ssl_ready={} errors={} failed={} skipped={} deadline_reached={} elapsed_ms={}",
            summary.checked,
            summary.activated,
            summary.ssl_ready,
            summary.errors,
            summary.failed,
            summary.skipped,
            summary.deadline_reached,
            started.elapsed().as_millis()
        );
        Ok(summary)
    }
}

#[async_trait]
impl Job for ReconciliationJob {
    fn name(&self) -> &'static str {
        "reconciliation_sweep"
    }

    async fn run(&self) -> CoreResult<()> {
        self.run_once().await.map(|_| ())
    }
}
