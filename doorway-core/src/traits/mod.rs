//! Storage layer abstraction trait definition

mod account_repository;
mod certificate_manager;
mod domain_repository;
mod provider_registry;
mod server_repository;
mod site_deployments;

pub use account_repository::DnsAccountRepository;
pub use certificate_manager::CertificateManager;
pub use domain_repository::DomainRepository;
pub use provider_registry::{InMemoryProviderRegistry, ProviderRegistry};
pub use server_repository::ServerRepository;
pub use site_deployments::{NoDeployments, SiteDeployments};
