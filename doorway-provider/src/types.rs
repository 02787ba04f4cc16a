use serde::{Deserialize, Serialize};

// ============ Provider Types ============

/// Identifies which DNS provider implementation to use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Cloudflare. Terminates TLS at its edge (Universal SSL).
    Cloudflare,
    /// Tencent Cloud `DNSPod`. Authoritative DNS only, no edge TLS.
    Dnspod,
}

impl ProviderType {
    /// Minimum TTL (seconds) the provider accepts for a non-proxied record.
    pub fn min_ttl(self) -> u32 {
        match self {
            Self::Cloudflare => 60,
            Self::Dnspod => 600,
        }
    }

    /// Whether the provider can issue and terminate certificates on its own.
    ///
    /// Providers without edge TLS rely on a reverse proxy for certificates.
    pub fn supports_edge_tls(self) -> bool {
        matches!(self, Self::Cloudflare)
    }

    /// Clamp a requested TTL to what the provider will accept.
    ///
    /// Proxied Cloudflare records always use `1` ("automatic").
    pub fn normalize_ttl(self, ttl: u32, proxied: bool) -> u32 {
        match self {
            Self::Cloudflare if proxied => 1,
            _ => ttl.max(self.min_ttl()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cloudflare => "cloudflare",
            Self::Dnspod => "dnspod",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cloudflare" => Ok(Self::Cloudflare),
            "dnspod" => Ok(Self::Dnspod),
            other => Err(format!("unknown provider type: {other}")),
        }
    }
}

// ============ Zone Types ============

/// Zone status normalized across providers.
///
/// Each provider reports activation differently; the provider implementations
/// are responsible for mapping their native fields onto this enum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ZoneStatus {
    /// Nameservers are verified and the zone is serving.
    Active,
    /// Waiting for the registrar to point at the provider's nameservers.
    Pending,
    /// Provider is still setting the zone up.
    Initializing,
    /// Zone was deleted or moved away.
    Deleted,
    /// Status could not be interpreted.
    Unknown,
}

impl ZoneStatus {
    /// Statuses that mean "nothing to do yet, check again later".
    pub fn is_waiting(self) -> bool {
        matches!(self, Self::Pending | Self::Initializing)
    }
}

impl std::fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Initializing => "initializing",
            Self::Deleted => "deleted",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Address of a zone at the provider.
///
/// Cloudflare addresses zones by `id`; `DNSPod` accepts either but prefers the
/// domain name, so both are carried on every zone-scoped call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZoneRef {
    pub id: String,
    pub name: String,
}

impl ZoneRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Result of registering a new zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneCreated {
    pub zone_id: String,
    pub name: String,
    /// Nameservers the registrar must delegate to.
    pub nameservers: Vec<String>,
    /// Provider status string exactly as returned.
    pub raw_status: String,
}

impl ZoneCreated {
    pub fn zone_ref(&self) -> ZoneRef {
        ZoneRef::new(self.zone_id.clone(), self.name.clone())
    }
}

/// Current state of a zone at the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDetails {
    pub id: String,
    pub name: String,
    pub status: ZoneStatus,
    pub nameservers: Vec<String>,
    /// Provider status string exactly as returned.
    pub raw_status: String,
    /// Secondary provider diagnostic, when the provider has one.
    ///
    /// `DNSPod` reports e.g. `DNSERROR` or `NOTEXIST` here while the
    /// delegation is not yet visible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl ZoneDetails {
    /// Human readable description of a non-active status, used as an error message.
    pub fn describe(&self) -> String {
        match &self.diagnostic {
            Some(diag) => format!("zone status '{}' ({diag})", self.raw_status),
            None => format!("zone status '{}'", self.raw_status),
        }
    }
}

// ============ TLS ============

/// Certificate state of a domain.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TlsStatus {
    /// Nothing requested yet, or the provider has no edge TLS.
    #[default]
    None,
    /// Issuance in progress.
    Pending,
    /// A valid certificate is being served.
    Active,
    /// Issuance failed or the certificate is unusable.
    Error,
}

impl std::fmt::Display for TlsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for TlsStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown tls status: {other}")),
        }
    }
}

// ============ Record Types ============

/// DNS record types handled by the provisioning flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsRecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Txt,
    Ns,
    Srv,
    Caa,
}

/// A DNS record inside a zone.
///
/// `name` is relative to the zone (`@` for the apex).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DnsRecord {
    pub id: String,
    pub record_type: DnsRecordType,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    /// Only meaningful for Cloudflare.
    #[serde(default)]
    pub proxied: bool,
}

/// Request to create or replace a record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordRequest {
    pub record_type: DnsRecordType,
    /// Relative name, `@` for the apex.
    pub name: String,
    pub content: String,
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
}

impl RecordRequest {
    /// An `A` record request.
    pub fn a(name: impl Into<String>, ip: impl Into<String>, ttl: u32, proxied: bool) -> Self {
        Self {
            record_type: DnsRecordType::A,
            name: name.into(),
            content: ip.into(),
            ttl,
            proxied,
        }
    }

    /// Whether `record` is the slot this request targets (same type and name).
    pub fn targets(&self, record: &DnsRecord) -> bool {
        record.record_type == self.record_type && record.name.eq_ignore_ascii_case(&self.name)
    }

    /// Whether `record` already holds what this request would write.
    pub fn is_satisfied_by(&self, record: &DnsRecord) -> bool {
        self.targets(record)
            && record.content == self.content
            && record.ttl == self.ttl
            && record.proxied == self.proxied
    }
}

// ============ Credentials ============

/// Type-safe credential container for the supported DNS providers.
///
/// Serialized as a tagged enum with `"provider"` as the tag and `"credentials"` as the content:
///
/// ```json
/// { "provider": "cloudflare", "credentials": { "api_token": "..." } }
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "provider", content = "credentials")]
pub enum ProviderCredentials {
    #[serde(rename = "cloudflare")]
    Cloudflare {
        api_token: String,
        /// Needed for `POST /zones`; tokens scoped to several accounts must name one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        account_id: Option<String>,
    },

    #[serde(rename = "dnspod")]
    Dnspod {
        secret_id: String,
        secret_key: String,
    },
}

impl ProviderCredentials {
    /// Returns the [`ProviderType`] corresponding to this credential variant.
    pub fn provider_type(&self) -> ProviderType {
        match self {
            Self::Cloudflare { .. } => ProviderType::Cloudflare,
            Self::Dnspod { .. } => ProviderType::Dnspod,
        }
    }
}

// 凭证不能出现在日志里
impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cloudflare { account_id, .. } => f
                .debug_struct("Cloudflare")
                .field("api_token", &"***")
                .field("account_id", account_id)
                .finish(),
            Self::Dnspod { secret_id, .. } => f
                .debug_struct("Dnspod")
                .field("secret_id", secret_id)
                .field("secret_key", &"***")
                .finish(),
        }
    }
}
