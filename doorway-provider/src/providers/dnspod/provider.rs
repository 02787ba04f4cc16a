//! DNSPod DnsProvider trait 实现

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};
use crate::providers::common::{parse_record_type, record_type_to_string};
use crate::traits::{DnsProvider, ErrorContext, ProviderErrorMapper};
use crate::types::{
    DnsRecord, ProviderType, RecordRequest, ZoneCreated, ZoneDetails, ZoneRef, ZoneStatus,
};

use super::types::{DomainSelector, RecordBody};
use super::{
    CreateDomainResponse, CreateRecordResponse, DEFAULT_RECORD_LINE, DescribeDomainResponse,
    DnspodProvider, DomainListResponse, MAX_PAGE_SIZE, RecordListResponse,
};

/// Empty acknowledgement returned by write actions.
#[derive(Debug, Deserialize)]
struct Ack {}

impl DnspodProvider {
    /// 将 DNSPod 域名状态转换为统一状态
    ///
    /// `DNSPod` 用两个字段表达激活状态：`Status`（ENABLE/PAUSE/SPAM/LOCK）
    /// 和 `DNSStatus`。只有 ENABLE 且 `DNSStatus` 为空才算生效；
    /// `DNSStatus` 非空（如 DNSERROR）表示 NS 尚未指向 DNSPod，原值作为诊断信息保留。
    pub(crate) fn normalize_zone_status(
        status: &str,
        dns_status: &str,
    ) -> (ZoneStatus, Option<String>) {
        let diagnostic = Some(dns_status.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        match status.to_ascii_uppercase().as_str() {
            "ENABLE" if diagnostic.is_none() => (ZoneStatus::Active, None),
            "ENABLE" => (ZoneStatus::Pending, diagnostic),
            _ => (ZoneStatus::Unknown, diagnostic),
        }
    }

    /// Numeric `DomainId` from a zone ref, if the id is one.
    fn selector(zone: &ZoneRef) -> DomainSelector<'_> {
        DomainSelector {
            domain: &zone.name,
            domain_id: zone.id.parse().ok(),
        }
    }

    fn parse_record_id(&self, record_id: &str) -> Result<u64> {
        record_id
            .parse()
            .map_err(|_| ProviderError::RecordNotFound {
                provider: self.provider_name().to_string(),
                record_id: record_id.to_string(),
                raw_message: Some("record id is not numeric".to_string()),
            })
    }

    fn record_body<'a>(
        zone: &'a ZoneRef,
        record_id: Option<u64>,
        req: &'a RecordRequest,
    ) -> RecordBody<'a> {
        RecordBody {
            selector: Self::selector(zone),
            record_id,
            sub_domain: &req.name,
            record_type: record_type_to_string(req.record_type),
            record_line: DEFAULT_RECORD_LINE,
            value: &req.content,
            ttl: ProviderType::Dnspod.normalize_ttl(req.ttl, false),
        }
    }

    async fn describe_domain(&self, selector: &DomainSelector<'_>) -> Result<ZoneDetails> {
        let response: DescribeDomainResponse = self
            .request(
                "DescribeDomain",
                selector,
                ErrorContext::domain(selector.domain),
            )
            .await?;
        let info = response.domain_info;
        let (status, diagnostic) = Self::normalize_zone_status(&info.status, &info.dns_status);

        Ok(ZoneDetails {
            id: info.domain_id.to_string(),
            name: info.domain,
            status,
            nameservers: info.dnspod_ns_list,
            raw_status: info.status,
            diagnostic,
        })
    }
}

#[async_trait]
impl DnsProvider for DnspodProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Dnspod
    }

    async fn validate_credentials(&self) -> Result<bool> {
        #[derive(Serialize)]
        struct DescribeDomainListRequest {
            #[serde(rename = "Offset")]
            offset: u32,
            #[serde(rename = "Limit")]
            limit: u32,
        }

        let req = DescribeDomainListRequest {
            offset: 0,
            limit: 1,
        };
        match self
            .request::<DomainListResponse, _>("DescribeDomainList", &req, ErrorContext::default())
            .await
        {
            Ok(resp) => {
                log::debug!(
                    "[dnspod] credentials valid, {} domain(s) visible",
                    resp.domain_count_info
                        .and_then(|c| c.all_total)
                        .unwrap_or(0)
                );
                Ok(true)
            }
            // 账号下没有任何域名
            Err(ProviderError::DomainNotFound { .. }) => Ok(true),
            Err(ProviderError::InvalidCredentials { .. } | ProviderError::PermissionDenied { .. }) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn add_zone(&self, name: &str) -> Result<ZoneCreated> {
        #[derive(Serialize)]
        struct CreateDomainRequest<'a> {
            #[serde(rename = "Domain")]
            domain: &'a str,
        }

        let response: CreateDomainResponse = self
            .request(
                "CreateDomain",
                &CreateDomainRequest { domain: name },
                ErrorContext::domain(name),
            )
            .await?;
        let info = response.domain_info;

        log::info!("[dnspod] domain {} created as {}", info.domain, info.id);

        // CreateDomain 不返回状态，以 DescribeDomain 为准
        Ok(ZoneCreated {
            zone_id: info.id.to_string(),
            name: info.domain,
            nameservers: info.grade_ns_list,
            raw_status: "created".to_string(),
        })
    }

    async fn find_zone_by_name(&self, name: &str) -> Result<Option<ZoneRef>> {
        let selector = DomainSelector {
            domain: name,
            domain_id: None,
        };
        match self.describe_domain(&selector).await {
            Ok(details) => Ok(Some(ZoneRef::new(details.id, details.name))),
            Err(ProviderError::DomainNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_zone(&self, zone: &ZoneRef) -> Result<ZoneDetails> {
        self.describe_domain(&Self::selector(zone)).await
    }

    async fn remove_zone(&self, zone: &ZoneRef) -> Result<()> {
        let _: Ack = self
            .request(
                "DeleteDomain",
                &Self::selector(zone),
                ErrorContext::domain(&zone.name),
            )
            .await?;
        Ok(())
    }

    async fn list_records(&self, zone: &ZoneRef) -> Result<Vec<DnsRecord>> {
        #[derive(Serialize)]
        struct DescribeRecordListRequest<'a> {
            #[serde(flatten)]
            selector: DomainSelector<'a>,
            #[serde(rename = "Offset")]
            offset: u32,
            #[serde(rename = "Limit")]
            limit: u32,
        }

        let mut records = Vec::new();
        let mut offset = 0;
        loop {
            let req = DescribeRecordListRequest {
                selector: Self::selector(zone),
                offset,
                limit: MAX_PAGE_SIZE,
            };
            let page: RecordListResponse = match self
                .request("DescribeRecordList", &req, ErrorContext::domain(&zone.name))
                .await
            {
                Ok(page) => page,
                // 没有任何记录时 DNSPod 返回错误而不是空列表
                Err(ProviderError::RecordNotFound { .. }) => break,
                Err(e) => return Err(e),
            };

            let total = page
                .record_count_info
                .and_then(|c| c.total_count)
                .unwrap_or(0);
            let fetched = u32::try_from(page.record_list.len()).unwrap_or(u32::MAX);

            for r in page.record_list {
                let Ok(record_type) = parse_record_type(&r.record_type, self.provider_name())
                else {
                    continue;
                };
                records.push(DnsRecord {
                    id: r.record_id.to_string(),
                    record_type,
                    name: r.name,
                    content: r.value,
                    ttl: r.ttl,
                    proxied: false,
                });
            }

            offset = offset.saturating_add(fetched);
            if fetched == 0 || offset >= total {
                break;
            }
        }
        Ok(records)
    }

    async fn insert_record(&self, zone: &ZoneRef, req: &RecordRequest) -> Result<String> {
        let response: CreateRecordResponse = self
            .request(
                "CreateRecord",
                &Self::record_body(zone, None, req),
                ErrorContext::record(&zone.name, &req.name),
            )
            .await?;
        Ok(response.record_id.to_string())
    }

    async fn update_record(
        &self,
        zone: &ZoneRef,
        record_id: &str,
        req: &RecordRequest,
    ) -> Result<()> {
        let id = self.parse_record_id(record_id)?;
        let _: Ack = self
            .request(
                "ModifyRecord",
                &Self::record_body(zone, Some(id), req),
                ErrorContext::record_id(&zone.name, record_id),
            )
            .await?;
        Ok(())
    }

    async fn delete_record(&self, zone: &ZoneRef, record_id: &str) -> Result<()> {
        #[derive(Serialize)]
        struct DeleteRecordRequest<'a> {
            #[serde(flatten)]
            selector: DomainSelector<'a>,
            #[serde(rename = "RecordId")]
            record_id: u64,
        }

        let req = DeleteRecordRequest {
            selector: Self::selector(zone),
            record_id: self.parse_record_id(record_id)?,
        };
        let _: Ack = self
            .request(
                "DeleteRecord",
                &req,
                ErrorContext::record_id(&zone.name, record_id),
            )
            .await?;
        Ok(())
    }

    // setup_tls / get_tls_status: DNSPod 没有边缘证书，使用 trait 默认实现
}
