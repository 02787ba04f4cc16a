//! Provider factory.

use std::sync::Arc;

use crate::error::Result;
use crate::traits::DnsProvider;
use crate::types::ProviderCredentials;

#[cfg(feature = "cloudflare")]
use crate::providers::CloudflareProvider;
#[cfg(feature = "dnspod")]
use crate::providers::DnspodProvider;

/// Creates a [`DnsProvider`] from decrypted credentials.
///
/// The concrete implementation is chosen by the [`ProviderCredentials`]
/// variant, so a caller only ever needs the account's stored credentials.
///
/// # Examples
///
/// ```rust,no_run
/// use doorway_provider::{create_provider, ProviderCredentials};
///
/// let provider = create_provider(ProviderCredentials::Dnspod {
///     secret_id: "AKID...".to_string(),
///     secret_key: "...".to_string(),
/// }).unwrap();
/// ```
pub fn create_provider(credentials: ProviderCredentials) -> Result<Arc<dyn DnsProvider>> {
    match credentials {
        #[cfg(feature = "cloudflare")]
        ProviderCredentials::Cloudflare {
            api_token,
            account_id,
        } => Ok(Arc::new(
            CloudflareProvider::builder(api_token)
                .account_id(account_id)
                .build(),
        )),
        #[cfg(feature = "dnspod")]
        ProviderCredentials::Dnspod {
            secret_id,
            secret_key,
        } => Ok(Arc::new(DnspodProvider::new(secret_id, secret_key))),
        #[allow(unreachable_patterns)]
        other => Err(crate::error::ProviderError::InvalidParameter {
            provider: other.provider_type().to_string(),
            param: "provider".to_string(),
            detail: format!(
                "Provider '{}' is not enabled in this build",
                other.provider_type()
            ),
        }),
    }
}
