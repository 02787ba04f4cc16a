//! Cloudflare DnsProvider trait 实现

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use crate::error::{ProviderError, Result};
use crate::providers::common::{
    full_name_to_relative, parse_record_type, record_type_to_string, relative_to_full_name,
};
use crate::traits::{DnsProvider, ErrorContext, ProviderErrorMapper};
use crate::types::{
    DnsRecord, ProviderType, RecordRequest, TlsStatus, ZoneCreated, ZoneDetails, ZoneRef,
    ZoneStatus,
};

use super::types::RecordBody;
use super::{
    CloudflareDnsRecord, CloudflareProvider, CloudflareZone, MAX_PAGE_SIZE_RECORDS,
    SslVerification, TokenVerification,
};

impl CloudflareProvider {
    /// Cloudflare 只有一个 `status` 字段
    /// active, pending, initializing, moved, deleted, read only
    pub(crate) fn normalize_zone_status(status: &str) -> ZoneStatus {
        match status {
            "active" => ZoneStatus::Active,
            "pending" => ZoneStatus::Pending,
            "initializing" => ZoneStatus::Initializing,
            "moved" | "deleted" => ZoneStatus::Deleted,
            _ => ZoneStatus::Unknown,
        }
    }

    /// Map one certificate pack verification status.
    pub(crate) fn normalize_certificate_status(status: &str) -> TlsStatus {
        match status {
            "active" => TlsStatus::Active,
            "initializing" | "authorizing" | "issuing" | "pending_validation"
            | "pending_issuance" | "pending_deployment" => TlsStatus::Pending,
            "timing_out" | "timed_out" | "expired" | "deleted" | "deactivating"
            | "inactive" | "validation_timed_out" | "issuance_timed_out" => TlsStatus::Error,
            _ => TlsStatus::Pending,
        }
    }

    /// Any active certificate wins; an in-flight one means keep waiting.
    pub(crate) fn aggregate_tls_status(entries: &[SslVerification]) -> TlsStatus {
        let statuses: Vec<TlsStatus> = entries
            .iter()
            .map(|e| Self::normalize_certificate_status(&e.certificate_status))
            .collect();

        if statuses.contains(&TlsStatus::Active) {
            TlsStatus::Active
        } else if statuses.is_empty() || statuses.contains(&TlsStatus::Pending) {
            TlsStatus::Pending
        } else {
            TlsStatus::Error
        }
    }

    fn zone_to_details(zone: CloudflareZone) -> ZoneDetails {
        ZoneDetails {
            status: Self::normalize_zone_status(&zone.status),
            id: zone.id,
            name: zone.name,
            nameservers: zone.name_servers,
            raw_status: zone.status,
            diagnostic: None,
        }
    }

    fn cf_record_to_dns_record(&self, record: CloudflareDnsRecord, zone_name: &str) -> Result<DnsRecord> {
        Ok(DnsRecord {
            record_type: parse_record_type(&record.record_type, self.provider_name())?,
            name: full_name_to_relative(&record.name, zone_name),
            id: record.id,
            content: record.content,
            ttl: record.ttl,
            proxied: record.proxied.unwrap_or(false),
        })
    }

    fn record_body<'a>(req: &'a RecordRequest, zone_name: &str) -> RecordBody<'a> {
        RecordBody {
            record_type: record_type_to_string(req.record_type),
            name: relative_to_full_name(&req.name, zone_name),
            content: &req.content,
            ttl: ProviderType::Cloudflare.normalize_ttl(req.ttl, req.proxied),
            proxied: req.proxied,
        }
    }

    async fn patch_setting(&self, zone: &ZoneRef, setting: &str, value: &str) -> Result<()> {
        let _: serde_json::Value = self
            .patch(
                &format!("/zones/{}/settings/{setting}", zone.id),
                &json!({ "value": value }),
                ErrorContext::domain(&zone.name),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Cloudflare
    }

    async fn validate_credentials(&self) -> Result<bool> {
        match self
            .get::<TokenVerification>("/user/tokens/verify", ErrorContext::default())
            .await
        {
            Ok(resp) => Ok(resp.status == "active"),
            Err(ProviderError::InvalidCredentials { .. } | ProviderError::PermissionDenied { .. }) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn add_zone(&self, name: &str) -> Result<ZoneCreated> {
        #[derive(Serialize)]
        struct Account<'a> {
            id: &'a str,
        }

        #[derive(Serialize)]
        struct CreateZoneBody<'a> {
            name: &'a str,
            #[serde(rename = "type")]
            zone_type: &'static str,
            jump_start: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            account: Option<Account<'a>>,
        }

        let body = CreateZoneBody {
            name,
            zone_type: "full",
            jump_start: false,
            account: self.account_id.as_deref().map(|id| Account { id }),
        };

        let zone: CloudflareZone = self
            .post("/zones", &body, ErrorContext::domain(name))
            .await?;

        log::info!(
            "[cloudflare] zone {} created as {} ({})",
            zone.name,
            zone.id,
            zone.status
        );

        Ok(ZoneCreated {
            zone_id: zone.id,
            name: zone.name,
            nameservers: zone.name_servers,
            raw_status: zone.status,
        })
    }

    async fn find_zone_by_name(&self, name: &str) -> Result<Option<ZoneRef>> {
        let path = format!("/zones?name={}", urlencoding::encode(name));
        let (zones, _): (Vec<CloudflareZone>, bool) =
            self.get_page(&path, ErrorContext::domain(name)).await?;
        Ok(zones
            .into_iter()
            .find(|z| z.name.eq_ignore_ascii_case(name))
            .map(|z| ZoneRef::new(z.id, z.name)))
    }

    async fn get_zone(&self, zone: &ZoneRef) -> Result<ZoneDetails> {
        let cf_zone: CloudflareZone = self
            .get(&format!("/zones/{}", zone.id), ErrorContext::domain(&zone.name))
            .await?;
        Ok(Self::zone_to_details(cf_zone))
    }

    async fn remove_zone(&self, zone: &ZoneRef) -> Result<()> {
        self.delete(&format!("/zones/{}", zone.id), ErrorContext::domain(&zone.name))
            .await
    }

    async fn list_records(&self, zone: &ZoneRef) -> Result<Vec<DnsRecord>> {
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let path = format!(
                "/zones/{}/dns_records?page={page}&per_page={MAX_PAGE_SIZE_RECORDS}",
                zone.id
            );
            let (items, has_next): (Vec<CloudflareDnsRecord>, bool) =
                self.get_page(&path, ErrorContext::domain(&zone.name)).await?;

            for item in items {
                match self.cf_record_to_dns_record(item, &zone.name) {
                    Ok(record) => records.push(record),
                    // 不支持的类型直接跳过
                    Err(e) => log::debug!("[cloudflare] skipping record in {}: {e}", zone.name),
                }
            }

            if !has_next {
                break;
            }
            page += 1;
        }
        Ok(records)
    }

    async fn insert_record(&self, zone: &ZoneRef, req: &RecordRequest) -> Result<String> {
        let record: CloudflareDnsRecord = self
            .post(
                &format!("/zones/{}/dns_records", zone.id),
                &Self::record_body(req, &zone.name),
                ErrorContext::record(&zone.name, &req.name),
            )
            .await?;
        Ok(record.id)
    }

    async fn update_record(
        &self,
        zone: &ZoneRef,
        record_id: &str,
        req: &RecordRequest,
    ) -> Result<()> {
        let _: CloudflareDnsRecord = self
            .patch(
                &format!("/zones/{}/dns_records/{record_id}", zone.id),
                &Self::record_body(req, &zone.name),
                ErrorContext::record_id(&zone.name, record_id),
            )
            .await?;
        Ok(())
    }

    async fn delete_record(&self, zone: &ZoneRef, record_id: &str) -> Result<()> {
        self.delete(
            &format!("/zones/{}/dns_records/{record_id}", zone.id),
            ErrorContext::record_id(&zone.name, record_id),
        )
        .await
    }

    /// Flexible SSL at the edge plus HTTP → HTTPS redirects.
    ///
    /// The edge certificate is only issued once the zone is active; setting
    /// this earlier is accepted and takes effect later.
    async fn setup_tls(&self, zone: &ZoneRef) -> Result<bool> {
        self.patch_setting(zone, "ssl", "flexible").await?;
        self.patch_setting(zone, "always_use_https", "on").await?;
        log::info!("[cloudflare] edge TLS configured for {}", zone.name);
        Ok(true)
    }

    async fn get_tls_status(&self, zone: &ZoneRef) -> Result<TlsStatus> {
        let entries: Vec<SslVerification> = self
            .get(
                &format!("/zones/{}/ssl/verification", zone.id),
                ErrorContext::domain(&zone.name),
            )
            .await?;
        for entry in &entries {
            log::debug!(
                "[cloudflare] {} certificate for {}: {}",
                zone.name,
                entry.hostname.as_deref().unwrap_or("<zone>"),
                entry.certificate_status
            );
        }
        Ok(Self::aggregate_tls_status(&entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verification(status: &str) -> SslVerification {
        SslVerification {
            certificate_status: status.to_string(),
            hostname: None,
        }
    }

    #[test]
    fn zone_status_single_field() {
        assert_eq!(
            CloudflareProvider::normalize_zone_status("active"),
            ZoneStatus::Active
        );
        assert_eq!(
            CloudflareProvider::normalize_zone_status("pending"),
            ZoneStatus::Pending
        );
        assert_eq!(
            CloudflareProvider::normalize_zone_status("initializing"),
            ZoneStatus::Initializing
        );
        assert_eq!(
            CloudflareProvider::normalize_zone_status("moved"),
            ZoneStatus::Deleted
        );
        assert_eq!(
            CloudflareProvider::normalize_zone_status("read only"),
            ZoneStatus::Unknown
        );
    }

    #[test]
    fn tls_status_aggregation() {
        assert_eq!(
            CloudflareProvider::aggregate_tls_status(&[]),
            TlsStatus::Pending
        );
        assert_eq!(
            CloudflareProvider::aggregate_tls_status(&[
                verification("pending_validation"),
                verification("active"),
            ]),
            TlsStatus::Active
        );
        assert_eq!(
            CloudflareProvider::aggregate_tls_status(&[verification("issuing")]),
            TlsStatus::Pending
        );
        assert_eq!(
            CloudflareProvider::aggregate_tls_status(&[verification("timing_out")]),
            TlsStatus::Error
        );
    }

    #[test]
    fn record_body_uses_fqdn_and_clamped_ttl() {
        let req = RecordRequest::a("www", "1.2.3.4", 30, false);
        let body = CloudflareProvider::record_body(&req, "example.com");
        assert_eq!(body.name, "www.example.com");
        assert_eq!(body.ttl, 60);
        assert_eq!(body.record_type, "A");

        let proxied = RecordRequest::a("@", "1.2.3.4", 600, true);
        let body = CloudflareProvider::record_body(&proxied, "example.com");
        assert_eq!(body.name, "example.com");
        assert_eq!(body.ttl, 1);
    }
}
