//! Doorway Core Library
//!
//! Domain provisioning for doorway sites:
//! - Provisioning Service (bulk add, removal, IP updates, rechecks)
//! - Reconciliation Job (periodic sweep of in-flight domains)
//! - Account Service (sealed provider credentials)
//! - Certificates (Caddy site entries, TLS probing)
//!
//! Storage is abstracted through traits; `doorway-app` provides the `SQLite`
//! implementation and the daemon.

pub mod certificates;
pub mod crypto;
pub mod error;
pub mod scheduler;
pub mod services;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use scheduler::{Job, JobRunner, Scheduler};
pub use services::{
    AccountService, ProvisioningConfig, ProvisioningService, ReconciliationJob, ServiceContext,
    SweepConfig,
};
pub use traits::{
    CertificateManager, DnsAccountRepository, DomainRepository, ProviderRegistry,
    ServerRepository, SiteDeployments,
};
