//! `SeaORM` entity for the `domains` table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "domains")]
/// Database row model for a managed domain.
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    pub dns_account_id: String,
    pub server_id: Option<String>,
    pub status: String,
    pub ssl_status: String,
    /// At most one of the two zone ids is set.
    pub cloudflare_zone_id: Option<String>,
    pub dnspod_domain_id: Option<String>,
    /// JSON array of nameserver hostnames.
    pub nameservers: String,
    pub last_check_at: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
