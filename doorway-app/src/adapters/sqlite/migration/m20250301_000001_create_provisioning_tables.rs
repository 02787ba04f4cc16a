use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // dns_accounts 表
        manager
            .create_table(
                Table::create()
                    .table(DnsAccount::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DnsAccount::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DnsAccount::Name).string().not_null())
                    .col(ColumnDef::new(DnsAccount::Provider).string().not_null())
                    .col(
                        ColumnDef::new(DnsAccount::IsActive)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(DnsAccount::Credentials).string().not_null())
                    .col(ColumnDef::new(DnsAccount::LastSyncAt).string().null())
                    .col(ColumnDef::new(DnsAccount::CreatedAt).string().not_null())
                    .col(ColumnDef::new(DnsAccount::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        // servers 表
        manager
            .create_table(
                Table::create()
                    .table(Server::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Server::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Server::Name).string().not_null())
                    .col(ColumnDef::new(Server::IpAddress).string().not_null())
                    .col(
                        ColumnDef::new(Server::IsPrimary)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Server::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Server::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        // domains 表
        manager
            .create_table(
                Table::create()
                    .table(Domain::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Domain::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Domain::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Domain::DnsAccountId).string().not_null())
                    .col(ColumnDef::new(Domain::ServerId).string().null())
                    .col(ColumnDef::new(Domain::Status).string().not_null())
                    .col(
                        ColumnDef::new(Domain::SslStatus)
                            .string()
                            .not_null()
                            .default("none"),
                    )
                    .col(ColumnDef::new(Domain::CloudflareZoneId).string().null())
                    .col(ColumnDef::new(Domain::DnspodDomainId).string().null())
                    .col(
                        ColumnDef::new(Domain::Nameservers)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(Domain::LastCheckAt).string().null())
                    .col(ColumnDef::new(Domain::ErrorMessage).string().null())
                    .col(ColumnDef::new(Domain::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Domain::UpdatedAt).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Domain::Table, Domain::DnsAccountId)
                            .to(DnsAccount::Table, DnsAccount::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Domain::Table, Domain::ServerId)
                            .to(Server::Table, Server::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // sweep 按 status + last_check_at 取批
        manager
            .create_index(
                Index::create()
                    .name("idx_domains_status_last_check")
                    .table(Domain::Table)
                    .col(Domain::Status)
                    .col(Domain::LastCheckAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Domain::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Server::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DnsAccount::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum DnsAccount {
    #[sea_orm(iden = "dns_accounts")]
    Table,
    Id,
    Name,
    Provider,
    IsActive,
    Credentials,
    LastSyncAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Server {
    #[sea_orm(iden = "servers")]
    Table,
    Id,
    Name,
    IpAddress,
    IsPrimary,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Domain {
    #[sea_orm(iden = "domains")]
    Table,
    Id,
    Name,
    DnsAccountId,
    ServerId,
    Status,
    SslStatus,
    CloudflareZoneId,
    DnspodDomainId,
    Nameservers,
    LastCheckAt,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}
