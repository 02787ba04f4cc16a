//! DNS Provider implementations

/// Shared utilities used by provider implementations.
pub mod common;

#[cfg(feature = "cloudflare")]
mod cloudflare;
#[cfg(feature = "dnspod")]
mod dnspod;

#[cfg(feature = "cloudflare")]
pub use cloudflare::{CloudflareProvider, CloudflareProviderBuilder};
#[cfg(feature = "dnspod")]
pub use dnspod::{DnspodProvider, DnspodProviderBuilder};
