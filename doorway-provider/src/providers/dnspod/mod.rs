//! 腾讯云 `DNSPod` Provider

mod error;
mod http;
mod provider;
mod sign;
mod types;

use reqwest::Client;

use crate::providers::common::create_http_client;

pub(crate) use types::{
    CreateDomainResponse, CreateRecordResponse, DescribeDomainResponse, DomainListResponse,
    RecordListResponse, TencentResponse,
};

pub(crate) const DNSPOD_API_HOST: &str = "dnspod.tencentcloudapi.com";
pub(crate) const DNSPOD_SERVICE: &str = "dnspod";
pub(crate) const DNSPOD_VERSION: &str = "2021-03-23";
/// `DNSPod` API 单页最大记录数
pub(crate) const MAX_PAGE_SIZE: u32 = 100;
/// 默认线路
pub(crate) const DEFAULT_RECORD_LINE: &str = "默认";

/// 腾讯云 `DNSPod` Provider
pub struct DnspodProvider {
    pub(crate) client: Client,
    pub(crate) secret_id: String,
    pub(crate) secret_key: String,
    pub(crate) endpoint: String,
    pub(crate) max_retries: u32,
}

/// `DNSPod` Provider Builder
pub struct DnspodProviderBuilder {
    secret_id: String,
    secret_key: String,
    endpoint: String,
    max_retries: u32,
}

impl DnspodProviderBuilder {
    fn new(secret_id: String, secret_key: String) -> Self {
        Self {
            secret_id,
            secret_key,
            endpoint: format!("https://{DNSPOD_API_HOST}"),
            max_retries: 2,
        }
    }

    /// Send requests somewhere other than the public endpoint.
    ///
    /// The signature still covers `DNSPOD_API_HOST`, which is also sent as the
    /// `Host` header.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn build(self) -> DnspodProvider {
        DnspodProvider {
            client: create_http_client(),
            secret_id: self.secret_id,
            secret_key: self.secret_key,
            endpoint: self.endpoint,
            max_retries: self.max_retries,
        }
    }
}

impl DnspodProvider {
    pub fn new(secret_id: String, secret_key: String) -> Self {
        Self::builder(secret_id, secret_key).build()
    }

    pub fn builder(secret_id: String, secret_key: String) -> DnspodProviderBuilder {
        DnspodProviderBuilder::new(secret_id, secret_key)
    }
}
