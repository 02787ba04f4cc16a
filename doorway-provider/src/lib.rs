//! # doorway-provider
//!
//! Clients for the DNS providers a doorway domain can be onboarded to.
//!
//! | Provider | Feature Flag | Auth Method | Edge TLS |
//! |----------|-------------|-------------|----------|
//! | [Cloudflare](https://www.cloudflare.com/) | `cloudflare` | Bearer Token | yes |
//! | [DNSPod (Tencent Cloud)](https://www.dnspod.cn/) | `dnspod` | TC3-HMAC-SHA256 | no |
//!
//! Every provider implements [`DnsProvider`]: register and remove zones,
//! manage records, configure and query edge TLS, and report zone activation
//! as a normalized [`ZoneStatus`].
//!
//! ## Feature Flags
//!
//! - **`all-providers`** *(default)*: both providers.
//! - **`cloudflare`**, **`dnspod`**: a single provider.
//! - **`rustls`** *(default)* / **`native-tls`**: TLS backend for `reqwest`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use doorway_provider::{create_provider, DnsProvider, ProviderCredentials, RecordRequest};
//!
//! # async fn run() -> doorway_provider::Result<()> {
//! let provider = create_provider(ProviderCredentials::Cloudflare {
//!     api_token: "your-token".to_string(),
//!     account_id: None,
//! })?;
//!
//! let zone = provider.add_zone("example.com").await?;
//! println!("delegate to {:?}", zone.nameservers);
//!
//! let zone_ref = zone.zone_ref();
//! provider
//!     .create_record(&zone_ref, &RecordRequest::a("@", "203.0.113.10", 600, false))
//!     .await?;
//! provider.setup_tls(&zone_ref).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, ProviderError>`](ProviderError).
//! [`ProviderError::ZoneExists`] and [`ProviderError::RecordExists`] signal
//! idempotency conflicts the caller can resolve by looking the object up.
//! Transient errors (`NetworkError`, `Timeout`, `RateLimited`) are retried
//! with exponential backoff before they are returned.

mod error;
mod factory;
mod http_client;
mod providers;
mod traits;
mod types;
mod utils;

pub use error::{ProviderError, Result};

pub use factory::create_provider;

// 内部 trait（ProviderErrorMapper）不导出
pub use traits::DnsProvider;

pub use types::{
    DnsRecord, DnsRecordType, ProviderCredentials, ProviderType, RecordRequest, TlsStatus,
    ZoneCreated, ZoneDetails, ZoneRef, ZoneStatus,
};

#[cfg(feature = "cloudflare")]
pub use providers::{CloudflareProvider, CloudflareProviderBuilder};

#[cfg(feature = "dnspod")]
pub use providers::{DnspodProvider, DnspodProviderBuilder};
