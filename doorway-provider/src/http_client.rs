//! Shared HTTP plumbing for the provider clients.
//!
//! Providers build their own `RequestBuilder` (auth and signing differ too much
//! to share), then hand it here to be sent, logged, classified and retried.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::ProviderError;
use crate::utils::log_sanitizer::truncate_for_log;

/// Upper bound for a server-provided `Retry-After`.
const MAX_RETRY_AFTER_SECS: u64 = 30;
/// Upper bound for computed backoff.
const MAX_BACKOFF_MS: u64 = 10_000;

/// HTTP tool function set
pub struct HttpUtils;

impl HttpUtils {
    /// Send a request and return `(status, body)`.
    ///
    /// Transport failures become `Timeout` or `NetworkError`. HTTP 429 becomes
    /// `RateLimited` and 502–504 become `NetworkError` so the retry loop can
    /// pick them up. Every other status is returned to the caller, which knows
    /// how its provider encodes errors in the body.
    pub async fn execute_request(
        request_builder: RequestBuilder,
        provider_name: &str,
        method_name: &str,
        url_or_action: &str,
    ) -> Result<(u16, String), ProviderError> {
        log::debug!("[{provider_name}] {method_name} {url_or_action}");

        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    provider: provider_name.to_string(),
                    detail: e.to_string(),
                }
            } else {
                ProviderError::NetworkError {
                    provider: provider_name.to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

        let status_code = response.status().as_u16();
        log::debug!("[{provider_name}] Response Status: {status_code}");

        // Retry-After 必须在读取 body 之前取出
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        if status_code == 429 {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{provider_name}] Rate limited (HTTP 429), retry_after={retry_after:?}");
            return Err(ProviderError::RateLimited {
                provider: provider_name.to_string(),
                retry_after,
                raw_message: Some(truncate_for_log(&body)),
            });
        }

        if matches!(status_code, 502..=504) {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{provider_name}] Upstream unavailable (HTTP {status_code})");
            return Err(ProviderError::NetworkError {
                provider: provider_name.to_string(),
                detail: format!("HTTP {status_code}: {}", truncate_for_log(&body)),
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError {
                provider: provider_name.to_string(),
                detail: format!("Failed to read response body: {e}"),
            })?;

        log::debug!(
            "[{provider_name}] Response Body: {}",
            truncate_for_log(&response_text)
        );

        Ok((status_code, response_text))
    }

    /// Deserialize a response body, mapping failures to `ParseError`.
    pub fn parse_json<T>(response_text: &str, provider_name: &str) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(response_text).map_err(|e| {
            log::error!(
                "[{provider_name}] JSON parse failed: {e}; raw response: {}",
                truncate_for_log(response_text)
            );
            ProviderError::ParseError {
                provider: provider_name.to_string(),
                detail: e.to_string(),
            }
        })
    }

    /// [`execute_request`](Self::execute_request) with retries on transient errors.
    ///
    /// Backoff is 100ms, 200ms, 400ms, ... capped at 10s; a `Retry-After` from
    /// a 429 takes precedence (capped at 30s). Business errors are returned
    /// immediately. `max_retries == 0` disables retrying.
    pub async fn execute_request_with_retry(
        request_builder: RequestBuilder,
        provider_name: &str,
        method_name: &str,
        url_or_action: &str,
        max_retries: u32,
    ) -> Result<(u16, String), ProviderError> {
        if max_retries == 0 {
            return Self::execute_request(
                request_builder,
                provider_name,
                method_name,
                url_or_action,
            )
            .await;
        }

        let mut last_error = None;

        for attempt in 0..=max_retries {
            // RequestBuilder 只能使用一次
            let Some(req) = request_builder.try_clone() else {
                log::warn!("[{provider_name}] Cannot clone request, sending without retry");
                return Self::execute_request(
                    request_builder,
                    provider_name,
                    method_name,
                    url_or_action,
                )
                .await;
            };

            match Self::execute_request(req, provider_name, method_name, url_or_action).await {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < max_retries && e.is_transient() => {
                    let delay = retry_delay(&e, attempt);
                    log::warn!(
                        "[{provider_name}] {method_name} {url_or_action} failed (attempt {}/{}), retrying in {:.1}s: {e}",
                        attempt + 1,
                        max_retries + 1,
                        delay.as_secs_f32(),
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::NetworkError {
            provider: provider_name.to_string(),
            detail: "All retries exhausted with no error captured".to_string(),
        }))
    }
}

fn retry_delay(error: &ProviderError, attempt: u32) -> Duration {
    if let ProviderError::RateLimited {
        retry_after: Some(secs),
        ..
    } = error
    {
        Duration::from_secs((*secs).min(MAX_RETRY_AFTER_SECS))
    } else {
        backoff_delay(attempt)
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    // 防止 2^attempt 溢出
    let capped_attempt = attempt.min(20);
    let delay_ms = 100_u64.saturating_mul(1_u64 << capped_attempt);
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}
