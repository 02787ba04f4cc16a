//! Cloudflare DNS Provider

mod error;
mod http;
mod provider;
mod types;

use reqwest::Client;

use crate::providers::common::create_http_client;

pub(crate) use types::{
    CloudflareDnsRecord, CloudflareResponse, CloudflareZone, SslVerification, TokenVerification,
};

pub(crate) const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";
/// Cloudflare DNS Records API 单页最大记录数
pub(crate) const MAX_PAGE_SIZE_RECORDS: u32 = 100;

/// Cloudflare DNS Provider
///
/// Authenticates with an API token. Zone creation needs the account id when
/// the token can see more than one account.
pub struct CloudflareProvider {
    pub(crate) client: Client,
    pub(crate) api_token: String,
    pub(crate) account_id: Option<String>,
    pub(crate) base_url: String,
    pub(crate) max_retries: u32,
}

/// Cloudflare Provider Builder
pub struct CloudflareProviderBuilder {
    api_token: String,
    account_id: Option<String>,
    base_url: String,
    max_retries: u32,
}

impl CloudflareProviderBuilder {
    fn new(api_token: String) -> Self {
        Self {
            api_token,
            account_id: None,
            base_url: CF_API_BASE.to_string(),
            max_retries: 2,
        }
    }

    #[must_use]
    pub fn account_id(mut self, account_id: Option<String>) -> Self {
        self.account_id = account_id.filter(|id| !id.is_empty());
        self
    }

    /// Override the API endpoint (mock servers in tests).
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn build(self) -> CloudflareProvider {
        CloudflareProvider {
            client: create_http_client(),
            api_token: self.api_token,
            account_id: self.account_id,
            base_url: self.base_url,
            max_retries: self.max_retries,
        }
    }
}

impl CloudflareProvider {
    pub fn new(api_token: String) -> Self {
        Self::builder(api_token).build()
    }

    pub fn builder(api_token: String) -> CloudflareProviderBuilder {
        CloudflareProviderBuilder::new(api_token)
    }
}
