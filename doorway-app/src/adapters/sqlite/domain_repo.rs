//! `DomainRepository` implementation for `SqliteStore`.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    SqlErr, sea_query::Expr,
};

use doorway_core::error::{CoreError, CoreResult};
use doorway_core::traits::DomainRepository;
use doorway_core::types::{Domain, DomainPatch, DomainStatus, TlsStatus, ZoneBinding};

use super::entity::domain;
use super::{SqliteStore, format_timestamp, parse_timestamp, storage_error};

impl domain::Model {
    /// Convert a `SeaORM` row model into a `Domain`.
    fn into_domain(self) -> CoreResult<Domain> {
        let status: DomainStatus = self
            .status
            .parse()
            .map_err(|e: String| CoreError::SerializationError(e))?;
        let ssl_status: TlsStatus = self
            .ssl_status
            .parse()
            .map_err(|e: String| CoreError::SerializationError(e))?;
        let zone = ZoneBinding::from_columns(self.cloudflare_zone_id, self.dnspod_domain_id)
            .map_err(CoreError::SerializationError)?;
        let nameservers: Vec<String> = serde_json::from_str(&self.nameservers)
            .map_err(|e| CoreError::SerializationError(format!("Invalid nameservers JSON: {e}")))?;

        Ok(Domain {
            id: self.id,
            name: self.name,
            dns_account_id: self.dns_account_id,
            server_id: self.server_id,
            status,
            ssl_status,
            zone,
            nameservers,
            last_check_at: self
                .last_check_at
                .as_deref()
                .map(|s| parse_timestamp("last_check_at", s))
                .transpose()?,
            error_message: self.error_message,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
        })
    }
}

fn nameservers_json(nameservers: &[String]) -> CoreResult<String> {
    serde_json::to_string(nameservers).map_err(|e| CoreError::SerializationError(e.to_string()))
}

fn domain_to_active_model(domain: &Domain) -> CoreResult<domain::ActiveModel> {
    let (cloudflare_zone_id, dnspod_domain_id) = ZoneBinding::to_columns(domain.zone.as_ref());

    Ok(domain::ActiveModel {
        id: Set(domain.id.clone()),
        name: Set(domain.name.clone()),
        dns_account_id: Set(domain.dns_account_id.clone()),
        server_id: Set(domain.server_id.clone()),
        status: Set(domain.status.as_str().to_string()),
        ssl_status: Set(domain.ssl_status.to_string()),
        cloudflare_zone_id: Set(cloudflare_zone_id),
        dnspod_domain_id: Set(dnspod_domain_id),
        nameservers: Set(nameservers_json(&domain.nameservers)?),
        last_check_at: Set(domain.last_check_at.map(format_timestamp)),
        error_message: Set(domain.error_message.clone()),
        created_at: Set(format_timestamp(domain.created_at)),
        updated_at: Set(format_timestamp(domain.updated_at)),
    })
}

#[async_trait]
impl DomainRepository for SqliteStore {
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Domain>> {
        domain::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| storage_error("query domain", e))?
            .map(domain::Model::into_domain)
            .transpose()
    }

    async fn existing_names(&self, names: &[String]) -> CoreResult<HashSet<String>> {
        if names.is_empty() {
            return Ok(HashSet::new());
        }
        let found: Vec<String> = domain::Entity::find()
            .select_only()
            .column(domain::Column::Name)
            .filter(domain::Column::Name.is_in(names.iter().map(String::as_str)))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| storage_error("query domain names", e))?;
        Ok(found.into_iter().collect())
    }

    async fn insert(&self, domain: &Domain) -> CoreResult<()> {
        let model = domain_to_active_model(domain)?;
        domain::Entity::insert(model)
            .exec(&self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    CoreError::ValidationError(format!("domain already exists: {}", domain.name))
                }
                _ => storage_error("insert domain", e),
            })?;
        Ok(())
    }

    async fn update_if_status(
        &self,
        id: &str,
        expected: DomainStatus,
        patch: &DomainPatch,
    ) -> CoreResult<bool> {
        patch.check_transition(expected)?;
        let mut update = domain::Entity::update_many()
            .col_expr(
                domain::Column::UpdatedAt,
                Expr::value(format_timestamp(Utc::now())),
            )
            .filter(domain::Column::Id.eq(id))
            .filter(domain::Column::Status.eq(expected.as_str()));

        if let Some(status) = patch.status {
            update = update.col_expr(domain::Column::Status, Expr::value(status.as_str()));
        }
        if let Some(ssl_status) = patch.ssl_status {
            update = update.col_expr(domain::Column::SslStatus, Expr::value(ssl_status.to_string()));
        }
        if let Some(nameservers) = &patch.nameservers {
            update = update.col_expr(
                domain::Column::Nameservers,
                Expr::value(nameservers_json(nameservers)?),
            );
        }
        if let Some(error_message) = &patch.error_message {
            update = update.col_expr(
                domain::Column::ErrorMessage,
                Expr::value(error_message.clone()),
            );
        }
        if let Some(at) = patch.last_check_at {
            update = update.col_expr(
                domain::Column::LastCheckAt,
                Expr::value(format_timestamp(at)),
            );
        }

        let result = update
            .exec(&self.db)
            .await
            .map_err(|e| storage_error("update domain", e))?;
        Ok(result.rows_affected > 0)
    }

    async fn find_reconcilable(
        &self,
        statuses: &[DomainStatus],
        account_ids: &[String],
        limit: usize,
    ) -> CoreResult<Vec<Domain>> {
        if statuses.is_empty() || account_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        // SQLite 升序时 NULL 排在最前：从未检查过的优先
        let rows = domain::Entity::find()
            .filter(domain::Column::Status.is_in(statuses.iter().map(|s| s.as_str())))
            .filter(domain::Column::DnsAccountId.is_in(account_ids.iter().map(String::as_str)))
            .filter(
                Condition::any()
                    .add(domain::Column::CloudflareZoneId.is_not_null())
                    .add(domain::Column::DnspodDomainId.is_not_null()),
            )
            .order_by_asc(domain::Column::LastCheckAt)
            .order_by_asc(domain::Column::CreatedAt)
            .limit(u64::try_from(limit).unwrap_or(u64::MAX))
            .all(&self.db)
            .await
            .map_err(|e| storage_error("query reconcilable domains", e))?;

        rows.into_iter().map(domain::Model::into_domain).collect()
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        domain::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| storage_error("delete domain", e))?;
        Ok(())
    }
}
