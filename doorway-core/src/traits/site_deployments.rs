use async_trait::async_trait;

use crate::error::CoreResult;

/// Deployment state of the site built for a domain.
///
/// Sites are managed outside this crate; removal only needs to know whether
/// one is live.
#[async_trait]
pub trait SiteDeployments: Send + Sync {
    async fn has_active_deployment(&self, domain_id: &str) -> CoreResult<bool>;
}

/// For installs without a site pipeline: nothing is ever deployed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDeployments;

#[async_trait]
impl SiteDeployments for NoDeployments {
    async fn has_active_deployment(&self, _domain_id: &str) -> CoreResult<bool> {
        Ok(false)
    }
}
