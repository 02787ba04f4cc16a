//! `DNSPod` HTTP 请求方法

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};
use crate::utils::log_sanitizer::truncate_for_log;

use super::types::TencentError;
use super::{DNSPOD_API_HOST, DNSPOD_VERSION, DnspodProvider, TencentResponse};

impl DnspodProvider {
    /// 执行腾讯云 API 请求
    pub(crate) async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        action: &str,
        body: &B,
        ctx: ErrorContext,
    ) -> Result<T> {
        // 1. 序列化请求体
        let payload =
            serde_json::to_string(body).map_err(|e| ProviderError::SerializationError {
                provider: self.provider_name().to_string(),
                detail: e.to_string(),
            })?;

        log::debug!("[dnspod] {action} body: {}", truncate_for_log(&payload));

        // 2. 生成签名
        let timestamp = Utc::now().timestamp();
        let authorization = self.sign(action, &payload, timestamp);

        // 3. 发送请求
        let request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json; charset=utf-8")
            .header("Host", DNSPOD_API_HOST)
            .header("X-TC-Action", action)
            .header("X-TC-Version", DNSPOD_VERSION)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("Authorization", authorization)
            .body(payload);

        let (_status, response_text) = HttpUtils::execute_request_with_retry(
            request,
            self.provider_name(),
            "POST",
            &format!("Action: {action}"),
            self.max_retries,
        )
        .await?;

        // 4. 解析响应
        let envelope: TencentResponse =
            HttpUtils::parse_json(&response_text, self.provider_name())?;

        // 5. 处理错误
        if let Some(error) = envelope.response.get("Error") {
            let error: TencentError = serde_json::from_value(error.clone())
                .map_err(|e| self.parse_error(format!("malformed Error object: {e}")))?;
            let err = self.map_error(RawApiError::with_code(error.code, error.message), ctx);
            if err.is_expected() {
                log::warn!("[dnspod] {action}: {err}");
            } else {
                log::error!("[dnspod] {action}: {err}");
            }
            return Err(err);
        }

        // 6. 提取数据
        serde_json::from_value(envelope.response).map_err(|e| self.parse_error(e))
    }
}
