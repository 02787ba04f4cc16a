//! 配置文件
//!
//! `doorwayd` reads one TOML file. Every section has defaults, so an empty
//! file (or none at all) gives a working local setup once a key is provided.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use doorway_core::crypto::KeyRing;
use doorway_core::error::{CoreError, CoreResult};
use doorway_core::{ProvisioningConfig, SweepConfig};

/// Environment variable that overrides `secrets.master_key`.
pub const MASTER_KEY_ENV: &str = "DOORWAY_MASTER_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading \"{path}\": {err}")]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("error parsing \"{path}\": {err}")]
    Parse {
        path: PathBuf,
        #[source]
        err: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub secrets: SecretsConfig,
    pub provisioning: ProvisioningSection,
    pub reconciliation: ReconciliationSection,
    pub caddy: CaddySection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/doorway.db"),
        }
    }
}

/// Where the credential key comes from. `master_key` wins over `passphrase`.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// Base64 of 32 random bytes.
    pub master_key: Option<String>,
    pub passphrase: Option<String>,
    pub key_id: Option<String>,
    /// Earlier keys by id, still needed to open credentials sealed before a rotation.
    pub retired_keys: Vec<RetiredKey>,
}

// 不输出密钥内容
impl std::fmt::Debug for SecretsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsConfig")
            .field("master_key", &self.master_key.as_ref().map(|_| "<redacted>"))
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .field("key_id", &self.key_id)
            .field(
                "retired_keys",
                &self.retired_keys.iter().map(|k| &k.key_id).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct RetiredKey {
    pub key_id: String,
    pub master_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningSection {
    pub provider_call_delay_ms: u64,
    pub record_ttl: u32,
    pub backend_port: u16,
}

impl Default for ProvisioningSection {
    fn default() -> Self {
        let defaults = ProvisioningConfig::default();
        Self {
            provider_call_delay_ms: duration_ms(defaults.provider_call_delay),
            record_ttl: defaults.record_ttl,
            backend_port: defaults.backend_port,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationSection {
    /// 0 disables the sweep.
    pub interval_secs: u64,
    pub batch_size: usize,
    pub domain_delay_ms: u64,
    pub run_budget_secs: u64,
}

impl Default for ReconciliationSection {
    fn default() -> Self {
        let defaults = SweepConfig::default();
        Self {
            interval_secs: 300,
            batch_size: defaults.batch_size,
            domain_delay_ms: duration_ms(defaults.domain_delay),
            run_budget_secs: defaults.run_budget.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaddySection {
    pub sites_dir: PathBuf,
    /// Empty: Caddy is reloaded by something else (e.g. `--watch`).
    pub reload_command: Vec<String>,
}

impl Default for CaddySection {
    fn default() -> Self {
        Self {
            sites_dir: PathBuf::from("/etc/caddy/sites"),
            reload_command: vec![
                "caddy".to_string(),
                "reload".to_string(),
                "--config".to_string(),
                "/etc/caddy/Caddyfile".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl AppConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            err,
        })?;
        toml::from_str(&contents).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            err,
        })
    }

    /// Build the credential key ring, with `DOORWAY_MASTER_KEY` taking
    /// precedence over the file.
    pub fn key_ring(&self) -> CoreResult<KeyRing> {
        self.key_ring_with(std::env::var(MASTER_KEY_ENV).ok())
    }

    fn key_ring_with(&self, env_master_key: Option<String>) -> CoreResult<KeyRing> {
        let secrets = &self.secrets;
        let key_id = secrets.key_id.as_deref().unwrap_or("default");

        let env_master_key = env_master_key.filter(|k| !k.trim().is_empty());
        let master_key = env_master_key.as_deref().or(secrets.master_key.as_deref());

        let ring = match (master_key, secrets.passphrase.as_deref()) {
            (Some(key), _) => KeyRing::from_base64(key_id, key)?,
            (None, Some(passphrase)) => KeyRing::from_passphrase(key_id, passphrase)?,
            (None, None) => {
                return Err(CoreError::CredentialError(format!(
                    "no credential key configured: set {MASTER_KEY_ENV}, secrets.master_key or secrets.passphrase"
                )));
            }
        };

        secrets.retired_keys.iter().try_fold(ring, |ring, retired| {
            ring.with_retired_base64(retired.key_id.as_str(), &retired.master_key)
        })
    }

    pub fn provisioning_config(&self) -> ProvisioningConfig {
        ProvisioningConfig {
            provider_call_delay: Duration::from_millis(self.provisioning.provider_call_delay_ms),
            record_ttl: self.provisioning.record_ttl,
            backend_port: self.provisioning.backend_port,
        }
    }

    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig {
            batch_size: self.reconciliation.batch_size,
            domain_delay: Duration::from_millis(self.reconciliation.domain_delay_ms),
            run_budget: Duration::from_secs(self.reconciliation.run_budget_secs),
        }
    }

    /// `None` when the sweep is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.reconciliation.interval_secs > 0)
            .then(|| Duration::from_secs(self.reconciliation.interval_secs))
    }
}
