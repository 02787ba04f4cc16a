//! Domain lifecycle types

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use doorway_provider::{ProviderType, TlsStatus, ZoneRef};

use crate::error::{CoreError, CoreResult};

/// Labels of letters, digits and inner hyphens, ending in an alphabetic TLD.
static DOMAIN_NAME_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$").ok()
});

const MAX_DOMAIN_NAME_LEN: usize = 253;

/// Trim, lowercase and drop one trailing dot.
pub fn normalize_domain_name(raw: &str) -> String {
    let name = raw.trim().to_ascii_lowercase();
    match name.strip_suffix('.') {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

/// Whether an already normalized name is a registrable host name.
pub fn is_valid_domain_name(name: &str) -> bool {
    name.len() <= MAX_DOMAIN_NAME_LEN
        && DOMAIN_NAME_RE
            .as_ref()
            .is_some_and(|re| re.is_match(name))
}

/// 域名生命周期状态
///
/// ```text
/// pending → dns_configuring → ssl_pending → active
///                 │                │
///                 └──→ error ←─────┘
/// ```
///
/// `suspended` is only ever set by an operator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    Pending,
    DnsConfiguring,
    SslPending,
    Active,
    Error,
    Suspended,
}

impl DomainStatus {
    /// Statuses the reconciliation sweep polls.
    pub const RECONCILABLE: [Self; 2] = [Self::DnsConfiguring, Self::SslPending];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::DnsConfiguring => "dns_configuring",
            Self::SslPending => "ssl_pending",
            Self::Active => "active",
            Self::Error => "error",
            Self::Suspended => "suspended",
        }
    }

    pub fn is_reconcilable(self) -> bool {
        Self::RECONCILABLE.contains(&self)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Status only moves forward; `error` is reachable from the two in-flight
    /// states and `suspended` from anything but itself.
    pub fn can_transition_to(self, next: Self) -> bool {
        use DomainStatus::{Active, DnsConfiguring, Error, Pending, SslPending, Suspended};
        match (self, next) {
            (Pending, DnsConfiguring)
            | (DnsConfiguring, SslPending)
            | (SslPending, Active)
            | (DnsConfiguring | SslPending, Error) => true,
            (from, Suspended) => from != Suspended,
            _ => false,
        }
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "dns_configuring" => Ok(Self::DnsConfiguring),
            "ssl_pending" => Ok(Self::SslPending),
            "active" => Ok(Self::Active),
            "error" => Ok(Self::Error),
            "suspended" => Ok(Self::Suspended),
            other => Err(format!("unknown domain status: {other}")),
        }
    }
}

/// The provider-side identifier a domain is bound to.
///
/// Exactly one provider's id can be set, and it has to belong to the
/// provider of the domain's DNS account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ZoneBinding {
    Cloudflare { zone_id: String },
    Dnspod { domain_id: String },
}

impl ZoneBinding {
    pub fn new(provider: ProviderType, id: impl Into<String>) -> Self {
        match provider {
            ProviderType::Cloudflare => Self::Cloudflare { zone_id: id.into() },
            ProviderType::Dnspod => Self::Dnspod {
                domain_id: id.into(),
            },
        }
    }

    pub fn provider_type(&self) -> ProviderType {
        match self {
            Self::Cloudflare { .. } => ProviderType::Cloudflare,
            Self::Dnspod { .. } => ProviderType::Dnspod,
        }
    }

    pub fn zone_id(&self) -> &str {
        match self {
            Self::Cloudflare { zone_id } => zone_id,
            Self::Dnspod { domain_id } => domain_id,
        }
    }

    pub fn matches(&self, provider: ProviderType) -> bool {
        self.provider_type() == provider
    }

    pub fn zone_ref(&self, domain_name: &str) -> ZoneRef {
        ZoneRef::new(self.zone_id(), domain_name)
    }

    /// Rebuild from the two nullable storage columns.
    pub fn from_columns(
        cloudflare_zone_id: Option<String>,
        dnspod_domain_id: Option<String>,
    ) -> Result<Option<Self>, String> {
        match (cloudflare_zone_id, dnspod_domain_id) {
            (None, None) => Ok(None),
            (Some(zone_id), None) => Ok(Some(Self::Cloudflare { zone_id })),
            (None, Some(domain_id)) => Ok(Some(Self::Dnspod { domain_id })),
            (Some(cf), Some(dp)) => Err(format!(
                "domain bound to both cloudflare zone {cf} and dnspod domain {dp}"
            )),
        }
    }

    /// Split into `(cloudflare_zone_id, dnspod_domain_id)` columns.
    pub fn to_columns(binding: Option<&Self>) -> (Option<String>, Option<String>) {
        match binding {
            None => (None, None),
            Some(Self::Cloudflare { zone_id }) => (Some(zone_id.clone()), None),
            Some(Self::Dnspod { domain_id }) => (None, Some(domain_id.clone())),
        }
    }
}

/// 托管域名
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    /// Trimmed, lowercase, no trailing dot.
    pub name: String,
    pub dns_account_id: String,
    pub server_id: Option<String>,
    pub status: DomainStatus,
    pub ssl_status: TlsStatus,
    pub zone: Option<ZoneBinding>,
    /// Nameservers the registrar has to delegate to, in provider order.
    pub nameservers: Vec<String>,
    pub last_check_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Domain {
    /// A domain whose zone was just created at the provider.
    pub fn provisioned(
        name: String,
        dns_account_id: String,
        server_id: Option<String>,
        zone: ZoneBinding,
        nameservers: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            dns_account_id,
            server_id,
            status: DomainStatus::DnsConfiguring,
            ssl_status: TlsStatus::None,
            zone: Some(zone),
            nameservers,
            last_check_at: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied by [`DomainRepository::update_if_status`](crate::traits::DomainRepository::update_if_status).
///
/// `None` leaves a field untouched. `error_message: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainPatch {
    pub status: Option<DomainStatus>,
    pub ssl_status: Option<TlsStatus>,
    pub nameservers: Option<Vec<String>>,
    pub error_message: Option<Option<String>>,
    pub last_check_at: Option<DateTime<Utc>>,
}

impl DomainPatch {
    /// Only bump `last_check_at`.
    pub fn checked(at: DateTime<Utc>) -> Self {
        Self {
            last_check_at: Some(at),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn status(mut self, status: DomainStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn ssl_status(mut self, ssl_status: TlsStatus) -> Self {
        self.ssl_status = Some(ssl_status);
        self
    }

    #[must_use]
    pub fn nameservers(mut self, nameservers: Vec<String>) -> Self {
        self.nameservers = Some(nameservers);
        self
    }

    #[must_use]
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(Some(message.into()));
        self
    }

    #[must_use]
    pub fn clear_error(mut self) -> Self {
        self.error_message = Some(None);
        self
    }

    /// Reject a status change the lifecycle does not allow from `from`.
    ///
    /// Rewriting the current status is a no-op and passes.
    pub fn check_transition(&self, from: DomainStatus) -> CoreResult<()> {
        match self.status {
            Some(next) if next != from && !from.can_transition_to(next) => Err(
                CoreError::ValidationError(format!("illegal status transition {from} -> {next}")),
            ),
            _ => Ok(()),
        }
    }

    /// Apply to an in-memory domain and bump `updated_at`.
    pub fn apply_to(&self, domain: &mut Domain) {
        if let Some(status) = self.status {
            domain.status = status;
        }
        if let Some(ssl_status) = self.ssl_status {
            domain.ssl_status = ssl_status;
        }
        if let Some(nameservers) = &self.nameservers {
            domain.nameservers.clone_from(nameservers);
        }
        if let Some(error_message) = &self.error_message {
            domain.error_message.clone_from(error_message);
        }
        if let Some(at) = self.last_check_at {
            domain.last_check_at = Some(at);
        }
        domain.updated_at = Utc::now();
    }
}
