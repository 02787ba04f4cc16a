//! Cloudflare error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::CloudflareProvider;

fn or_unknown(value: Option<String>) -> String {
    value.unwrap_or_else(|| "<unknown>".to_string())
}

/// Cloudflare error code mapping
/// Reference: <https://developers.cloudflare.com/fundamentals/api/reference/errors/>
impl ProviderErrorMapper for CloudflareProvider {
    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let provider = self.provider_name().to_string();
        match raw.code.as_deref() {
            // 6003: Invalid request headers
            // 6111: Invalid format for Authorization header
            // 9103: Unknown X-Auth-Key or X-Auth-Email
            // 9109: Invalid access token
            // 10000: Authentication error
            Some("6003" | "6111" | "9103" | "9109" | "10000") => {
                ProviderError::InvalidCredentials {
                    provider,
                    raw_message: Some(raw.message),
                }
            }

            // 1061: <domain> already exists
            Some("1061") => ProviderError::ZoneExists {
                provider,
                domain: or_unknown(context.domain),
                raw_message: Some(raw.message),
            },

            // 1049: <domain> is not a registered domain
            // 1099: Domain name is invalid
            Some("1049" | "1099") => ProviderError::InvalidParameter {
                provider,
                param: "domain".to_string(),
                detail: raw.message,
            },

            // 1068: Permission denied
            // 1117: Zone belongs to another account / cannot be added
            Some("1068" | "1117") => ProviderError::PermissionDenied {
                provider,
                raw_message: Some(raw.message),
            },

            // 1097: This zone is banned
            Some("1097") => ProviderError::DomainLocked {
                provider,
                domain: or_unknown(context.domain),
                raw_message: Some(raw.message),
            },

            // 1004: DNS Validation Error
            // 9005: Content for A record is invalid
            // 9021: Invalid TTL
            // 9041: This DNS record cannot be proxied
            Some(code @ ("1004" | "9005" | "9021" | "9041")) => {
                let param = match code {
                    "9005" => "content",
                    "9021" => "ttl",
                    "9041" => "proxied",
                    _ => "general",
                };
                ProviderError::InvalidParameter {
                    provider,
                    param: param.to_string(),
                    detail: raw.message,
                }
            }

            // 81053: An A, AAAA or CNAME record already exists with that host
            // 81057: The record already exists
            // 81058: A record with those settings already exists
            Some("81053" | "81057" | "81058") => ProviderError::RecordExists {
                provider,
                record_name: or_unknown(context.record_name),
                raw_message: Some(raw.message),
            },

            // 81044: Record does not exist
            Some("81044") => ProviderError::RecordNotFound {
                provider,
                record_id: or_unknown(context.record_id),
                raw_message: Some(raw.message),
            },

            // 81045: The record quota has been exceeded
            // 1105: Zone limit reached for this account
            Some("81045" | "1105") => ProviderError::QuotaExceeded {
                provider,
                raw_message: Some(raw.message),
            },

            // 7003: Could not route to /zones/<id>, perhaps your object identifier is invalid?
            // 1001: Invalid zone identifier
            Some("7003" | "1001") => ProviderError::DomainNotFound {
                provider,
                domain: or_unknown(context.domain),
                raw_message: Some(raw.message),
            },

            _ => self.unknown_error(raw),
        }
    }
}
