//! Reverse proxy certificate management abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{CertificateCheck, HostChange};

/// Certificates for domains whose DNS provider has no edge TLS.
///
/// The reverse proxy obtains and renews certificates itself once it serves a
/// host; this trait only tells it which hosts to serve and checks the result.
#[async_trait]
pub trait CertificateManager: Send + Sync {
    /// Serve `domain` (and `www.domain`), proxying to `backend`.
    ///
    /// An existing configuration for the domain is replaced.
    async fn add_host(&self, domain: &str, backend: &str) -> CoreResult<HostChange>;

    /// Stop serving `domain`. Removing an unknown host is not an error.
    async fn remove_host(&self, domain: &str) -> CoreResult<HostChange>;

    /// Probe the certificate currently served for `domain`.
    async fn check_certificate(&self, domain: &str) -> CoreResult<CertificateCheck>;
}
