//! `DNSPod` error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::DnspodProvider;

fn or_unknown(value: Option<String>) -> String {
    value.unwrap_or_else(|| "<unknown>".to_string())
}

/// `DNSPod` Error code mapping
/// Reference: <https://cloud.tencent.com/document/api/1427/56192>
impl ProviderErrorMapper for DnspodProvider {
    fn provider_name(&self) -> &'static str {
        "dnspod"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let provider = self.provider_name().to_string();
        match raw.code.as_deref() {
            // ============ Authentication error ============
            Some(
                "AuthFailure"
                | "AuthFailure.InvalidAuthorization"
                | "AuthFailure.InvalidSecretId"
                | "AuthFailure.SecretIdNotFound"
                | "AuthFailure.SignatureExpire"
                | "AuthFailure.SignatureFailure"
                | "AuthFailure.TokenFailure"
                | "InvalidParameter.InvalidSecretId"
                | "InvalidParameter.InvalidSignature",
            ) => ProviderError::InvalidCredentials {
                provider,
                raw_message: Some(raw.message),
            },

            // ============ Zone already exists ============
            Some("InvalidParameter.DomainExists" | "FailedOperation.DomainExists") => {
                ProviderError::ZoneExists {
                    provider,
                    domain: or_unknown(context.domain),
                    raw_message: Some(raw.message),
                }
            }

            // ============ Record already exists ============
            Some("InvalidParameter.DomainRecordExist") => ProviderError::RecordExists {
                provider,
                record_name: or_unknown(context.record_name),
                raw_message: Some(raw.message),
            },

            // ============ Not found ============
            Some("ResourceNotFound.NoDataOfDomain" | "InvalidParameterValue.DomainNotExists") => {
                ProviderError::DomainNotFound {
                    provider,
                    domain: or_unknown(context.domain),
                    raw_message: Some(raw.message),
                }
            }
            Some("ResourceNotFound.NoDataOfRecord" | "InvalidParameter.RecordIdInvalid") => {
                ProviderError::RecordNotFound {
                    provider,
                    record_id: or_unknown(context.record_id),
                    raw_message: Some(raw.message),
                }
            }

            // ============ Quota limit (resources run out, no retry) ============
            Some(
                "LimitExceeded"
                | "LimitExceeded.AAAACountLimit"
                | "LimitExceeded.SubdomainRollLimit"
                | "RequestLimitExceeded.CreateDomainLimit"
                | "RequestLimitExceeded.UinLimitExceeded",
            ) => ProviderError::QuotaExceeded {
                provider,
                raw_message: Some(raw.message),
            },

            // ============ Frequency limit (temporary, can be retried) ============
            Some(
                "RequestLimitExceeded"
                | "FailedOperation.FrequencyLimit"
                | "InvalidParameter.OperationIsTooFrequent",
            ) => ProviderError::RateLimited {
                provider,
                retry_after: None,
                raw_message: Some(raw.message),
            },

            // ============ Domain name is locked/disabled ============
            Some(
                "FailedOperation.DomainIsLocked"
                | "FailedOperation.DomainIsSpam"
                | "FailedOperation.AccountIsLocked",
            ) => ProviderError::DomainLocked {
                provider,
                domain: or_unknown(context.domain),
                raw_message: Some(raw.message),
            },

            // ============ Permission / ownership ============
            Some(
                "FailedOperation.DomainOwnedByOtherUser"
                | "FailedOperation.NotDomainOwner"
                | "OperationDenied"
                | "OperationDenied.DomainOwnerAllowedOnly"
                | "OperationDenied.NoPermissionToOperateDomain"
                | "UnauthorizedOperation",
            ) => ProviderError::PermissionDenied {
                provider,
                raw_message: Some(raw.message),
            },

            // ============ Invalid parameter ============
            Some(
                "InvalidParameter.DomainInvalid"
                | "InvalidParameter.DomainTooLong"
                | "InvalidParameter.DomainTypeInvalid"
                | "InvalidParameter.DomainNotBeian",
            ) => ProviderError::InvalidParameter {
                provider,
                param: "domain".to_string(),
                detail: raw.message,
            },
            Some("InvalidParameter.SubdomainInvalid") => ProviderError::InvalidParameter {
                provider,
                param: "subdomain".to_string(),
                detail: raw.message,
            },
            Some(
                "InvalidParameter.RecordValueInvalid" | "InvalidParameter.RecordValueLengthInvalid",
            ) => ProviderError::InvalidParameter {
                provider,
                param: "value".to_string(),
                detail: raw.message,
            },
            Some("LimitExceeded.RecordTtlLimit") => ProviderError::InvalidParameter {
                provider,
                param: "ttl".to_string(),
                detail: raw.message,
            },
            Some("InvalidParameter.RecordLineInvalid") => ProviderError::InvalidParameter {
                provider,
                param: "line".to_string(),
                detail: raw.message,
            },

            // ============ Other errors fallback ============
            _ => self.unknown_error(raw),
        }
    }
}
