//! 批量操作与核对结果类型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use doorway_provider::TlsStatus;

use super::DomainStatus;

/// Outcome of a multi-domain operation.
///
/// Both lists are always present; one item failing never fails the batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkResult {
    pub success: Vec<BulkSuccess>,
    pub failed: Vec<BulkFailure>,
}

impl BulkResult {
    pub fn succeed(
        &mut self,
        name: impl Into<String>,
        domain_id: impl Into<String>,
        warnings: Vec<String>,
    ) {
        self.success.push(BulkSuccess {
            name: name.into(),
            domain_id: domain_id.into(),
            warnings,
        });
    }

    pub fn fail(&mut self, name: impl Into<String>, error: impl Into<String>) {
        self.failed.push(BulkFailure {
            name: name.into(),
            error: error.into(),
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSuccess {
    pub name: String,
    pub domain_id: String,
    /// Non-fatal problems (record or TLS setup) the operator should see.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFailure {
    pub name: String,
    pub error: String,
}

/// Result of removing a domain.
///
/// The local row is always gone afterwards; this tells whether the remote
/// side followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RemovalOutcome {
    FullyRemoved,
    RemoteCleanupFailed { reason: String },
    /// Nothing remote to clean up (no zone binding, or the account is gone).
    LocalOnly,
}

/// What one reconciliation pass did to a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecheckOutcome {
    /// Zone became active, domain moved to `ssl_pending`.
    ZoneActivated,
    /// Certificate became active, domain moved to `active`.
    SslReady,
    /// Domain moved to `error`.
    Errored,
    /// Certificate issuance failed; status kept, `ssl_status=error`.
    TlsFailed,
    /// Still waiting on the provider.
    Unchanged,
    /// A provider or storage call failed; status kept.
    Failed,
    /// Not polled: lost a concurrent update, status not reconcilable, or
    /// the account is unavailable.
    Skipped,
}

/// Result of an operator-triggered recheck.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecheckResult {
    pub domain_id: String,
    pub name: String,
    pub previous: DomainStatus,
    pub current: DomainStatus,
    pub ssl_status: TlsStatus,
    pub outcome: RecheckOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Counters of one reconciliation sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub checked: u32,
    /// `dns_configuring → ssl_pending`
    pub activated: u32,
    /// `ssl_pending → active`
    pub ssl_ready: u32,
    /// Moved to `error` or recorded a TLS failure.
    pub errors: u32,
    /// A provider or storage call failed.
    pub failed: u32,
    pub skipped: u32,
    /// The run budget ran out before the batch was done.
    pub deadline_reached: bool,
}

impl SweepSummary {
    pub fn record(&mut self, outcome: RecheckOutcome) {
        self.checked += 1;
        match outcome {
            RecheckOutcome::ZoneActivated => self.activated += 1,
            RecheckOutcome::SslReady => self.ssl_ready += 1,
            RecheckOutcome::Errored | RecheckOutcome::TlsFailed => self.errors += 1,
            RecheckOutcome::Failed => self.failed += 1,
            RecheckOutcome::Skipped => self.skipped += 1,
            RecheckOutcome::Unchanged => {}
        }
    }
}

/// Certificate served for a domain, as seen by a TLS probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateCheck {
    /// Handshake succeeded, certificate is inside its validity window and
    /// matches the hostname.
    pub valid: bool,
    pub issuer: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub days_remaining: Option<i64>,
    pub error: Option<String>,
}

impl CertificateCheck {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Result of changing the reverse proxy's host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum HostChange {
    /// Configuration written and proxy reloaded.
    Applied,
    /// Configuration written, reload failed. The change applies on the next
    /// successful reload.
    ReloadFailed { reason: String },
}
