//! 类型定义模块

mod account;
mod domain;
mod provisioning;
mod server;

pub use account::{CreateAccountRequest, DnsAccount};
pub use domain::{
    Domain, DomainPatch, DomainStatus, ZoneBinding, is_valid_domain_name, normalize_domain_name,
};
pub use provisioning::{
    BulkFailure, BulkResult, BulkSuccess, CertificateCheck, HostChange, RecheckOutcome,
    RecheckResult, RemovalOutcome, SweepSummary,
};
pub use server::Server;

// Re-export provider 库的公共类型
pub use doorway_provider::{
    DnsRecord, DnsRecordType, ProviderCredentials, ProviderType, RecordRequest, TlsStatus,
    ZoneDetails, ZoneRef, ZoneStatus,
};
