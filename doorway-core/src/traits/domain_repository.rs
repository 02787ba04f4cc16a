//! Domain persistence abstract Trait

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{Domain, DomainPatch, DomainStatus};

/// 域名仓库 Trait
///
/// All status writes go through [`update_if_status`](Self::update_if_status),
/// so two writers racing on the same domain cannot move it backward.
#[async_trait]
pub trait DomainRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Domain>>;

    /// Which of `names` already exist. Names are compared as stored (lowercase).
    async fn existing_names(&self, names: &[String]) -> CoreResult<HashSet<String>>;

    /// Insert a new domain. Fails if the name is taken.
    async fn insert(&self, domain: &Domain) -> CoreResult<()>;

    /// Apply `patch` only if the domain's status is still `expected`.
    ///
    /// Returns `false` when the row is gone or its status changed, i.e. the
    /// caller lost a race and must not assume its write happened.
    async fn update_if_status(
        &self,
        id: &str,
        expected: DomainStatus,
        patch: &DomainPatch,
    ) -> CoreResult<bool>;

    /// Domains due for reconciliation.
    ///
    /// Only domains with a zone binding, one of `statuses`, and an account in
    /// `account_ids`; ordered by `last_check_at` (never checked first), then
    /// `created_at`; at most `limit`.
    async fn find_reconcilable(
        &self,
        statuses: &[DomainStatus],
        account_ids: &[String],
        limit: usize,
    ) -> CoreResult<Vec<Domain>>;

    async fn delete(&self, id: &str) -> CoreResult<()>;
}
