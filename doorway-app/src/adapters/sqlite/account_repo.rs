//! `DnsAccountRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Value,
    sea_query::{Expr, OnConflict},
};

use doorway_core::crypto::SecretField;
use doorway_core::error::{CoreError, CoreResult};
use doorway_core::traits::DnsAccountRepository;
use doorway_core::types::{DnsAccount, ProviderType};

use super::entity::dns_account;
use super::{SqliteStore, format_timestamp, parse_timestamp, storage_error};

impl dns_account::Model {
    /// Convert a `SeaORM` row model into a `DnsAccount`.
    fn into_account(self) -> CoreResult<DnsAccount> {
        let provider: ProviderType = self
            .provider
            .parse()
            .map_err(|e: String| CoreError::SerializationError(e))?;
        let credentials: SecretField = self.credentials.parse()?;

        Ok(DnsAccount {
            id: self.id,
            name: self.name,
            provider,
            is_active: self.is_active != 0,
            credentials,
            last_sync_at: self
                .last_sync_at
                .as_deref()
                .map(|s| parse_timestamp("last_sync_at", s))
                .transpose()?,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
        })
    }
}

fn account_to_active_model(account: &DnsAccount) -> dns_account::ActiveModel {
    dns_account::ActiveModel {
        id: Set(account.id.clone()),
        name: Set(account.name.clone()),
        provider: Set(account.provider.as_str().to_string()),
        is_active: Set(i32::from(account.is_active)),
        credentials: Set(account.credentials.to_string()),
        last_sync_at: Set(account.last_sync_at.map(format_timestamp)),
        created_at: Set(format_timestamp(account.created_at)),
        updated_at: Set(format_timestamp(account.updated_at)),
    }
}

impl SqliteStore {
    /// Update one column of an account; `updated_at` is left alone.
    async fn update_account_column(
        &self,
        id: &str,
        column: dns_account::Column,
        value: impl Into<Value>,
    ) -> CoreResult<u64> {
        let result = dns_account::Entity::update_many()
            .col_expr(column, Expr::value(value))
            .filter(dns_account::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| storage_error("update account", e))?;
        Ok(result.rows_affected)
    }
}

#[async_trait]
impl DnsAccountRepository for SqliteStore {
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<DnsAccount>> {
        let row = dns_account::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| storage_error("query account", e))?;

        row.map(dns_account::Model::into_account).transpose()
    }

    async fn find_all(&self) -> CoreResult<Vec<DnsAccount>> {
        let rows = dns_account::Entity::find()
            .all(&self.db)
            .await
            .map_err(|e| storage_error("query accounts", e))?;

        rows.into_iter()
            .map(dns_account::Model::into_account)
            .collect()
    }

    async fn find_active_ids(&self) -> CoreResult<Vec<String>> {
        dns_account::Entity::find()
            .select_only()
            .column(dns_account::Column::Id)
            .filter(dns_account::Column::IsActive.eq(1))
            .into_tuple::<String>()
            .all(&self.db)
            .await
            .map_err(|e| storage_error("query active accounts", e))
    }

    async fn save(&self, account: &DnsAccount) -> CoreResult<()> {
        dns_account::Entity::insert(account_to_active_model(account))
            .on_conflict(
                OnConflict::column(dns_account::Column::Id)
                    .update_columns([
                        dns_account::Column::Name,
                        dns_account::Column::Provider,
                        dns_account::Column::IsActive,
                        dns_account::Column::Credentials,
                        dns_account::Column::LastSyncAt,
                        dns_account::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| storage_error("save account", e))?;

        Ok(())
    }

    // updated_at 是 provider 缓存的版本号，这里不改
    async fn set_active(&self, id: &str, active: bool) -> CoreResult<()> {
        let affected = self
            .update_account_column(
                id,
                dns_account::Column::IsActive,
                i32::from(active),
            )
            .await?;
        if affected == 0 {
            return Err(CoreError::AccountNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn touch_last_sync(&self, id: &str, at: DateTime<Utc>) -> CoreResult<()> {
        self.update_account_column(
            id,
            dns_account::Column::LastSyncAt,
            format_timestamp(at),
        )
        .await?;
        Ok(())
    }
}
