//! TLS 证书探测
//!
//! 使用 rustls 握手并解析对端叶子证书

#[cfg(feature = "rustls")]
use std::sync::Arc;
#[cfg(feature = "rustls")]
use std::time::Duration;

#[cfg(feature = "rustls")]
use chrono::{DateTime, Utc};
#[cfg(feature = "rustls")]
use log::{debug, trace, warn};
#[cfg(feature = "rustls")]
use rustls::crypto::CryptoProvider;
#[cfg(feature = "rustls")]
use rustls::{ClientConfig, RootCertStore};
#[cfg(feature = "rustls")]
use rustls_pki_types::ServerName;
#[cfg(feature = "rustls")]
use tokio::net::TcpStream;
#[cfg(feature = "rustls")]
use tokio::time::timeout;
#[cfg(feature = "rustls")]
use tokio_rustls::TlsConnector;
#[cfg(feature = "rustls")]
use x509_parser::prelude::*;

use crate::types::CertificateCheck;

#[cfg(feature = "rustls")]
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
#[cfg(feature = "rustls")]
const TLS_TIMEOUT: Duration = Duration::from_secs(5);

/// 初始化 rustls CryptoProvider（仅初始化一次）
#[cfg(feature = "rustls")]
fn ensure_crypto_provider() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // 宿主程序可能已经安装过
        if CryptoProvider::install_default(rustls::crypto::ring::default_provider()).is_err() {
            debug!("[TLS] rustls crypto provider already installed");
        }
    });
}

/// Probe the certificate served for `domain` on `port`.
///
/// Never fails: connection and handshake problems are reported through
/// [`CertificateCheck::error`] with `valid = false`.
#[cfg(feature = "rustls")]
pub async fn probe_certificate(domain: &str, port: u16) -> CertificateCheck {
    ensure_crypto_provider();
    let start_time = std::time::Instant::now();

    trace!("[TLS] Connecting to {domain}:{port}");
    let stream = match timeout(CONNECT_TIMEOUT, TcpStream::connect((domain, port))).await {
        Ok(Ok(s)) => s,
        Ok(Err(e)) => {
            warn!("[TLS] {domain}: TCP connection failed: {e}");
            return CertificateCheck::failed(format!("connection failed: {e}"));
        }
        Err(_) => {
            warn!("[TLS] {domain}: TCP connection timeout ({}s)", CONNECT_TIMEOUT.as_secs());
            return CertificateCheck::failed("connection timed out");
        }
    };

    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));

    let Ok(server_name) = ServerName::try_from(domain.to_string()) else {
        return CertificateCheck::failed(format!("invalid server name: {domain}"));
    };

    // 证书过期、域名不匹配或链不可信时握手本身就会失败
    let tls_stream = match timeout(TLS_TIMEOUT, connector.connect(server_name, stream)).await {
        Ok(Ok(s)) => s,
        Ok(Err(e)) => {
            warn!("[TLS] {domain}: handshake failed: {e}");
            return CertificateCheck::failed(format!("TLS handshake failed: {e}"));
        }
        Err(_) => {
            warn!("[TLS] {domain}: handshake timeout ({}s)", TLS_TIMEOUT.as_secs());
            return CertificateCheck::failed("TLS handshake timed out");
        }
    };

    let (_, tls_conn) = tls_stream.get_ref();
    let Some(leaf) = tls_conn.peer_certificates().and_then(|certs| certs.first()) else {
        return CertificateCheck::failed("no certificate presented");
    };
    let (_, cert) = match X509Certificate::from_der(leaf.as_ref()) {
        Ok(c) => c,
        Err(e) => return CertificateCheck::failed(format!("certificate parsing failed: {e}")),
    };

    let check = inspect_certificate(domain, &cert, Utc::now());
    debug!(
        "[TLS] {domain}: valid={} days_remaining={:?} took {:?}",
        check.valid,
        check.days_remaining,
        start_time.elapsed()
    );
    check
}

#[cfg(not(feature = "rustls"))]
pub async fn probe_certificate(_domain: &str, _port: u16) -> CertificateCheck {
    CertificateCheck::failed("certificate probing requires the rustls feature")
}

#[cfg(feature = "rustls")]
fn inspect_certificate(domain: &str, cert: &X509Certificate<'_>, now: DateTime<Utc>) -> CertificateCheck {
    let validity = cert.validity();
    let not_before = DateTime::from_timestamp(validity.not_before.timestamp(), 0);
    let not_after = DateTime::from_timestamp(validity.not_after.timestamp(), 0);

    let san: Vec<String> = cert
        .subject_alternative_name()
        .ok()
        .flatten()
        .map(|ext| {
            ext.value
                .general_names
                .iter()
                .filter_map(|name| match name {
                    GeneralName::DNSName(dns) => Some((*dns).to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    let cn = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok());

    let in_window = not_before.is_some_and(|t| t <= now) && not_after.is_some_and(|t| now < t);
    let names_match = check_domain_match(domain, cn, &san);

    let error = if !in_window {
        Some("certificate is outside its validity period".to_string())
    } else if !names_match {
        Some(format!("certificate does not cover {domain}"))
    } else {
        None
    };

    CertificateCheck {
        valid: error.is_none(),
        issuer: Some(cert.issuer().to_string()),
        expires_at: not_after,
        days_remaining: not_after.map(|t| (t - now).num_days()),
        error,
    }
}

/// 检查域名是否与证书的 CN 或 SAN 匹配
#[cfg_attr(not(feature = "rustls"), allow(dead_code))]
fn check_domain_match(domain: &str, cn: Option<&str>, san: &[String]) -> bool {
    let domain = domain.to_lowercase();
    cn.into_iter()
        .chain(san.iter().map(String::as_str))
        .any(|name| matches_domain(&domain, &name.to_lowercase()))
}

/// 域名匹配（支持通配符）
#[cfg_attr(not(feature = "rustls"), allow(dead_code))]
fn matches_domain(query: &str, pattern: &str) -> bool {
    if query == pattern {
        return true;
    }

    // 通配符只匹配一级子域名
    // 例如: *.example.com 匹配 foo.example.com，但不匹配 foo.bar.example.com
    pattern
        .strip_prefix("*.")
        .and_then(|suffix| query.strip_suffix(suffix))
        .and_then(|prefix| prefix.strip_suffix('.'))
        .is_some_and(|label| !label.is_empty() && !label.contains('.'))
}
