//! Caddy 站点配置
//!
//! Each domain gets its own `{sites_dir}/{domain}.caddy` fragment, imported by
//! the main Caddyfile. Caddy obtains the certificate on its own once the
//! fragment is loaded and DNS points at the server.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::certificates::probe_certificate;
use crate::error::{CoreError, CoreResult};
use crate::traits::CertificateManager;
use crate::types::{CertificateCheck, HostChange, is_valid_domain_name};

const RELOAD_TIMEOUT: Duration = Duration::from_secs(30);
const HTTPS_PORT: u16 = 443;
/// Upper bound for reload output kept in error messages.
const MAX_REASON_LEN: usize = 500;

pub struct CaddyCertificateManager {
    sites_dir: PathBuf,
    /// Program and arguments, e.g. `["caddy", "reload", "--config", "/etc/caddy/Caddyfile"]`.
    /// Empty means the caller reloads Caddy itself.
    reload_command: Vec<String>,
}

impl CaddyCertificateManager {
    pub fn new(sites_dir: impl Into<PathBuf>, reload_command: Vec<String>) -> Self {
        Self {
            sites_dir: sites_dir.into(),
            reload_command,
        }
    }

    pub fn sites_dir(&self) -> &Path {
        &self.sites_dir
    }

    fn site_path(&self, domain: &str) -> CoreResult<PathBuf> {
        if !is_valid_domain_name(domain) {
            return Err(CoreError::ValidationError(format!(
                "not a valid site name: {domain}"
            )));
        }
        Ok(self.sites_dir.join(format!("{domain}.caddy")))
    }

    /// Site block serving the apex and `www` through one reverse proxy.
    pub fn site_block(domain: &str, backend: &str) -> String {
        format!(
            "# managed by doorway, changes are overwritten\n\
             {domain}, www.{domain} {{\n\
             \treverse_proxy {backend}\n\
             }}\n"
        )
    }

    /// Write through a temporary file so Caddy never reads a half-written fragment.
    async fn write_atomically(path: &Path, contents: &str) -> CoreResult<()> {
        let tmp = path.with_extension("caddy.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| CoreError::ProxyError(format!("writing {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| CoreError::ProxyError(format!("replacing {}: {e}", path.display())))
    }

    async fn reload(&self) -> HostChange {
        let Some((program, args)) = self.reload_command.split_first() else {
            log::debug!("[caddy] no reload command configured");
            return HostChange::Applied;
        };

        let output = match tokio::time::timeout(
            RELOAD_TIMEOUT,
            Command::new(program).args(args).kill_on_drop(true).output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Self::reload_failed(format!("could not run {program}: {e}")),
            Err(_) => {
                return Self::reload_failed(format!(
                    "{program} did not finish within {}s",
                    RELOAD_TIMEOUT.as_secs()
                ));
            }
        };

        if output.status.success() {
            log::info!("[caddy] reloaded");
            HostChange::Applied
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            let detail: String = detail.chars().take(MAX_REASON_LEN).collect();
            Self::reload_failed(format!("{program} exited with {}: {detail}", output.status))
        }
    }

    fn reload_failed(reason: String) -> HostChange {
        log::warn!("[caddy] reload failed: {reason}");
        HostChange::ReloadFailed { reason }
    }
}

#[async_trait]
impl CertificateManager for CaddyCertificateManager {
    async fn add_host(&self, domain: &str, backend: &str) -> CoreResult<HostChange> {
        let path = self.site_path(domain)?;
        if backend.is_empty() || backend.contains(|c: char| c.is_whitespace() || c == '{' || c == '}') {
            return Err(CoreError::ValidationError(format!(
                "not a valid proxy backend: {backend:?}"
            )));
        }

        tokio::fs::create_dir_all(&self.sites_dir).await.map_err(|e| {
            CoreError::ProxyError(format!("creating {}: {e}", self.sites_dir.display()))
        })?;
        Self::write_atomically(&path, &Self::site_block(domain, backend)).await?;
        log::info!("proxy_host_added domain={domain} backend={backend}");

        Ok(self.reload().await)
    }

    async fn remove_host(&self, domain: &str) -> CoreResult<HostChange> {
        let path = self.site_path(domain)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => log::info!("proxy_host_removed domain={domain}"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("[caddy] no site file for {domain}");
            }
            Err(e) => {
                return Err(CoreError::ProxyError(format!(
                    "removing {}: {e}",
                    path.display()
                )));
            }
        }
        Ok(self.reload().await)
    }

    async fn check_certificate(&self, domain: &str) -> CoreResult<CertificateCheck> {
        Ok(probe_certificate(domain, HTTPS_PORT).await)
    }
}
