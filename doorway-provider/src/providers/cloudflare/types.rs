//! Cloudflare API 类型定义

use serde::{Deserialize, Serialize};

/// Cloudflare API 通用响应
#[derive(Debug, Deserialize)]
pub struct CloudflareResponse<T> {
    pub success: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub errors: Vec<CloudflareError>,
    pub result_info: Option<CloudflareResultInfo>,
}

#[derive(Debug, Deserialize)]
pub struct CloudflareError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudflareResultInfo {
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

impl CloudflareResultInfo {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Cloudflare Zone 结构
#[derive(Debug, Deserialize)]
pub struct CloudflareZone {
    pub id: String,
    pub name: String,
    /// `active`, `pending`, `initializing`, `moved`, `deleted`, `read only`
    pub status: String,
    #[serde(default)]
    pub name_servers: Vec<String>,
}

/// Cloudflare DNS Record 结构（响应）
#[derive(Debug, Deserialize)]
pub struct CloudflareDnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    #[serde(default)]
    pub proxied: Option<bool>,
}

/// Request body for creating or patching a record.
#[derive(Debug, Serialize)]
pub struct RecordBody<'a> {
    #[serde(rename = "type")]
    pub record_type: &'static str,
    pub name: String,
    pub content: &'a str,
    pub ttl: u32,
    pub proxied: bool,
}

/// One entry of `GET /zones/{id}/ssl/verification`.
#[derive(Debug, Deserialize)]
pub struct SslVerification {
    pub certificate_status: String,
    #[serde(default)]
    pub hostname: Option<String>,
}

/// Result of `GET /user/tokens/verify`.
#[derive(Debug, Deserialize)]
pub struct TokenVerification {
    pub status: String,
}
