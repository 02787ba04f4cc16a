//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::env;
use std::sync::Arc;

use doorway_provider::{DnsProvider, ProviderCredentials, create_provider};
use serde_json::{Value, json};

/// 跳过测试的宏（当环境变量缺失时）
#[macro_export]
macro_rules! skip_if_no_credentials {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("跳过测试: 缺少环境变量 {}", $var);
                return;
            }
        )+
    };
}

/// Cloudflare `{success, result, errors}` envelope.
pub fn cf_ok(result: Value) -> Value {
    json!({ "success": true, "errors": [], "messages": [], "result": result })
}

pub fn cf_err(code: i64, message: &str) -> Value {
    json!({
        "success": false,
        "errors": [{ "code": code, "message": message }],
        "messages": [],
        "result": null
    })
}

/// Tencent Cloud `{"Response": {...}}` envelope.
pub fn tc_ok(mut fields: Value) -> Value {
    if let Some(obj) = fields.as_object_mut() {
        obj.insert("RequestId".to_string(), json!("req-test"));
    }
    json!({ "Response": fields })
}

pub fn tc_err(code: &str, message: &str) -> Value {
    json!({
        "Response": {
            "Error": { "Code": code, "Message": message },
            "RequestId": "req-test"
        }
    })
}

/// 真实账号的测试上下文（仅用于 `#[ignore]` 测试）
pub struct LiveContext {
    pub provider: Arc<dyn DnsProvider>,
    pub domain: String,
}

impl LiveContext {
    pub fn cloudflare() -> Option<Self> {
        let api_token = env::var("CLOUDFLARE_API_KEY").ok()?;
        let domain = env::var("TEST_DOMAIN").ok()?;
        let provider = create_provider(ProviderCredentials::Cloudflare {
            api_token,
            account_id: env::var("CLOUDFLARE_ACCOUNT_ID").ok(),
        })
        .ok()?;
        Some(Self { provider, domain })
    }

    pub fn dnspod() -> Option<Self> {
        let secret_id = env::var("DNSPOD_SECRET_ID").ok()?;
        let secret_key = env::var("DNSPOD_SECRET_KEY").ok()?;
        let domain = env::var("TEST_DOMAIN").ok()?;
        let provider =
            create_provider(ProviderCredentials::Dnspod { secret_id, secret_key }).ok()?;
        Some(Self { provider, domain })
    }
}
