//! `ServerRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait,
    sea_query::{Expr, OnConflict},
};

use doorway_core::error::{CoreError, CoreResult};
use doorway_core::traits::ServerRepository;
use doorway_core::types::Server;

use super::entity::server;
use super::{SqliteStore, format_timestamp, parse_timestamp, storage_error};

impl server::Model {
    fn into_server(self) -> CoreResult<Server> {
        Ok(Server {
            id: self.id,
            name: self.name,
            ip_address: self.ip_address,
            is_primary: self.is_primary != 0,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
        })
    }
}

#[async_trait]
impl ServerRepository for SqliteStore {
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Server>> {
        server::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| storage_error("query server", e))?
            .map(server::Model::into_server)
            .transpose()
    }

    async fn find_primary(&self) -> CoreResult<Option<Server>> {
        server::Entity::find()
            .filter(server::Column::IsPrimary.eq(1))
            .one(&self.db)
            .await
            .map_err(|e| storage_error("query primary server", e))?
            .map(server::Model::into_server)
            .transpose()
    }

    /// `is_primary` is not written here; use [`set_primary`](Self::set_primary).
    async fn save(&self, server: &Server) -> CoreResult<()> {
        let model = server::ActiveModel {
            id: Set(server.id.clone()),
            name: Set(server.name.clone()),
            ip_address: Set(server.ip_address.clone()),
            is_primary: Set(0),
            created_at: Set(format_timestamp(server.created_at)),
            updated_at: Set(format_timestamp(server.updated_at)),
        };

        server::Entity::insert(model)
            .on_conflict(
                OnConflict::column(server::Column::Id)
                    .update_columns([
                        server::Column::Name,
                        server::Column::IpAddress,
                        server::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| storage_error("save server", e))?;

        Ok(())
    }

    async fn set_primary(&self, id: &str) -> CoreResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| storage_error("begin transaction", e))?;

        if server::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| storage_error("query server", e))?
            .is_none()
        {
            return Err(CoreError::ServerNotFound(id.to_string()));
        }

        server::Entity::update_many()
            .col_expr(server::Column::IsPrimary, Expr::value(0))
            .filter(server::Column::IsPrimary.eq(1))
            .exec(&txn)
            .await
            .map_err(|e| storage_error("clear primary server", e))?;
        server::Entity::update_many()
            .col_expr(server::Column::IsPrimary, Expr::value(1))
            .filter(server::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| storage_error("set primary server", e))?;

        txn.commit()
            .await
            .map_err(|e| storage_error("commit transaction", e))
    }
}
