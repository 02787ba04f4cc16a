//! `DNSPod` TC3-HMAC-SHA256 签名

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::providers::common::hmac_sha256;

use super::{DNSPOD_API_HOST, DNSPOD_SERVICE, DnspodProvider};

const ALGORITHM: &str = "TC3-HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-type;host;x-tc-action";

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

impl DnspodProvider {
    /// 生成 TC3-HMAC-SHA256 `Authorization` 头
    /// Reference: <https://cloud.tencent.com/document/api/1427/56189>
    pub(crate) fn sign(&self, action: &str, payload: &str, timestamp: i64) -> String {
        let date = DateTime::from_timestamp(timestamp, 0)
            .unwrap_or_else(Utc::now)
            .format("%Y-%m-%d")
            .to_string();

        // 1. 规范请求串
        let canonical_headers = format!(
            "content-type:application/json; charset=utf-8\nhost:{DNSPOD_API_HOST}\nx-tc-action:{}\n",
            action.to_lowercase()
        );
        let canonical_request = format!(
            "POST\n/\n\n{canonical_headers}\n{SIGNED_HEADERS}\n{}",
            sha256_hex(payload.as_bytes())
        );

        // 2. 待签名字符串
        let credential_scope = format!("{date}/{DNSPOD_SERVICE}/tc3_request");
        let string_to_sign = format!(
            "{ALGORITHM}\n{timestamp}\n{credential_scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        // 3. 派生签名密钥
        let secret_date = hmac_sha256(
            format!("TC3{}", self.secret_key).as_bytes(),
            date.as_bytes(),
        );
        let secret_service = hmac_sha256(&secret_date, DNSPOD_SERVICE.as_bytes());
        let secret_signing = hmac_sha256(&secret_service, b"tc3_request");
        let signature = hex::encode(hmac_sha256(&secret_signing, string_to_sign.as_bytes()));

        format!(
            "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            self.secret_id
        )
    }
}
