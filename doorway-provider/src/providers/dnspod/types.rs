//! Tencent Cloud `DNSPod` API type definition

use serde::{Deserialize, Serialize};

// ============ Tencent Cloud API response structure ============

/// Tencent Cloud response envelope.
///
/// `Response` holds either an `Error` object or the action's fields next to
/// `RequestId`, so it is kept as a raw value until the error check is done.
#[derive(Debug, Deserialize)]
pub struct TencentResponse {
    #[serde(rename = "Response")]
    pub response: serde_json::Value,
}

/// Error payload nested inside Tencent Cloud responses.
#[derive(Debug, Deserialize)]
pub struct TencentError {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message")]
    pub message: String,
}

// ============ Domain ============

/// Response payload for `CreateDomain`.
#[derive(Debug, Deserialize)]
pub struct CreateDomainResponse {
    #[serde(rename = "DomainInfo")]
    pub domain_info: CreatedDomainInfo,
}

#[derive(Debug, Deserialize)]
pub struct CreatedDomainInfo {
    #[serde(rename = "Id")]
    pub id: u64,
    #[serde(rename = "Domain")]
    pub domain: String,
    #[serde(rename = "GradeNsList", default)]
    pub grade_ns_list: Vec<String>,
}

/// Response payload for `DescribeDomain`.
#[derive(Debug, Deserialize)]
pub struct DescribeDomainResponse {
    #[serde(rename = "DomainInfo")]
    pub domain_info: DescribeDomainInfo,
}

/// Nested domain information in `DescribeDomain`.
///
/// Activation is the combination of `Status` and `DNSStatus`.
#[derive(Debug, Deserialize)]
pub struct DescribeDomainInfo {
    #[serde(rename = "DomainId")]
    pub domain_id: u64,
    #[serde(rename = "Domain")]
    pub domain: String,
    /// `ENABLE`, `PAUSE`, `SPAM`, `LOCK`
    #[serde(rename = "Status")]
    pub status: String,
    /// Empty when the registrar delegates to `DNSPod`, otherwise e.g. `DNSERROR`.
    #[serde(rename = "DNSStatus", default)]
    pub dns_status: String,
    #[serde(rename = "DnspodNsList", default)]
    pub dnspod_ns_list: Vec<String>,
}

/// Response payload for `DescribeDomainList`.
#[derive(Debug, Deserialize)]
pub struct DomainListResponse {
    #[serde(rename = "DomainCountInfo")]
    pub domain_count_info: Option<DomainCountInfo>,
}

#[derive(Debug, Deserialize)]
pub struct DomainCountInfo {
    #[serde(rename = "AllTotal")]
    pub all_total: Option<u32>,
}

// ============ Record ============

/// Response payload for `DescribeRecordList`.
#[derive(Debug, Deserialize)]
pub struct RecordListResponse {
    #[serde(rename = "RecordList", default)]
    pub record_list: Vec<DnspodRecord>,
    #[serde(rename = "RecordCountInfo")]
    pub record_count_info: Option<RecordCountInfo>,
}

#[derive(Debug, Deserialize)]
pub struct RecordCountInfo {
    #[serde(rename = "TotalCount")]
    pub total_count: Option<u32>,
}

/// DNS record item returned by `DescribeRecordList`.
#[derive(Debug, Deserialize)]
pub struct DnspodRecord {
    #[serde(rename = "RecordId")]
    pub record_id: u64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "TTL")]
    pub ttl: u32,
}

/// Response payload for `CreateRecord`.
#[derive(Debug, Deserialize)]
pub struct CreateRecordResponse {
    #[serde(rename = "RecordId")]
    pub record_id: u64,
}

/// `Domain` + `DomainId` pair most actions accept.
///
/// `DomainId` wins when both are sent, so a renamed zone is still addressed
/// correctly.
#[derive(Debug, Serialize)]
pub struct DomainSelector<'a> {
    #[serde(rename = "Domain")]
    pub domain: &'a str,
    #[serde(rename = "DomainId", skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<u64>,
}

/// Body for `CreateRecord` and `ModifyRecord`.
#[derive(Debug, Serialize)]
pub struct RecordBody<'a> {
    #[serde(flatten)]
    pub selector: DomainSelector<'a>,
    #[serde(rename = "RecordId", skip_serializing_if = "Option::is_none")]
    pub record_id: Option<u64>,
    #[serde(rename = "SubDomain")]
    pub sub_domain: &'a str,
    #[serde(rename = "RecordType")]
    pub record_type: &'static str,
    #[serde(rename = "RecordLine")]
    pub record_line: &'static str,
    #[serde(rename = "Value")]
    pub value: &'a str,
    #[serde(rename = "TTL")]
    pub ttl: u32,
}
