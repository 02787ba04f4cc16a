use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::Server;

/// 服务器仓库 Trait
#[async_trait]
pub trait ServerRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Server>>;

    async fn find_primary(&self) -> CoreResult<Option<Server>>;

    async fn save(&self, server: &Server) -> CoreResult<()>;

    /// Make `id` the only primary server.
    ///
    /// Implementations clear every other flag and set this one atomically.
    async fn set_primary(&self, id: &str) -> CoreResult<()>;
}
