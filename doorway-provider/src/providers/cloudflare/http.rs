//! Cloudflare HTTP 请求方法

use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::types::CloudflareResultInfo;
use super::{CloudflareProvider, CloudflareResponse};

impl CloudflareProvider {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("Authorization", format!("Bearer {}", self.api_token))
    }

    /// Send, retry, and unwrap the `{success, result, errors}` envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        method: &str,
        path: &str,
        ctx: ErrorContext,
    ) -> Result<CloudflareResponse<T>> {
        let (status, body) = HttpUtils::execute_request_with_retry(
            self.authorized(builder),
            self.provider_name(),
            method,
            path,
            self.max_retries,
        )
        .await?;

        let response: CloudflareResponse<T> = HttpUtils::parse_json(&body, self.provider_name())?;

        if !response.success {
            let raw = response.errors.first().map_or_else(
                || RawApiError::new(format!("HTTP {status} without error details")),
                |e| RawApiError::with_code(e.code.to_string(), e.message.clone()),
            );
            let err = self.map_error(raw, ctx);
            if err.is_expected() {
                log::warn!("[cloudflare] {method} {path}: {err}");
            } else {
                log::error!("[cloudflare] {method} {path}: {err}");
            }
            return Err(err);
        }

        Ok(response)
    }

    fn take_result<T>(&self, response: CloudflareResponse<T>) -> Result<T> {
        response
            .result
            .ok_or_else(|| self.parse_error("响应中缺少 result 字段"))
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, ctx: ErrorContext) -> Result<T> {
        let builder = self.client.get(self.url(path));
        let response = self.send(builder, "GET", path, ctx).await?;
        self.take_result(response)
    }

    /// GET one page of a list endpoint. Returns the items and whether more pages follow.
    pub(crate) async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        ctx: ErrorContext,
    ) -> Result<(Vec<T>, bool)> {
        let builder = self.client.get(self.url(path));
        let response: CloudflareResponse<Vec<T>> = self.send(builder, "GET", path, ctx).await?;
        let has_next = response
            .result_info
            .as_ref()
            .is_some_and(CloudflareResultInfo::has_next);
        Ok((response.result.unwrap_or_default(), has_next))
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        ctx: ErrorContext,
    ) -> Result<T> {
        let builder = self.client.post(self.url(path)).json(body);
        let response = self.send(builder, "POST", path, ctx).await?;
        self.take_result(response)
    }

    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        ctx: ErrorContext,
    ) -> Result<T> {
        let builder = self.client.patch(self.url(path)).json(body);
        let response = self.send(builder, "PATCH", path, ctx).await?;
        self.take_result(response)
    }

    pub(crate) async fn delete(&self, path: &str, ctx: ErrorContext) -> Result<()> {
        let builder = self.client.delete(self.url(path));
        let _: CloudflareResponse<serde_json::Value> =
            self.send(builder, "DELETE", path, ctx).await?;
        Ok(())
    }
}
