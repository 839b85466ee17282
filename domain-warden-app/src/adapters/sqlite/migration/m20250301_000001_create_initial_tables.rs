use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // domains
        manager
            .create_table(
                Table::create()
                    .table(Domain::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Domain::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Domain::FullDomain)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Domain::ParentZone).string().not_null())
                    .col(ColumnDef::new(Domain::Status).string().not_null())
                    .col(ColumnDef::new(Domain::SuspendReason).string().null())
                    .col(ColumnDef::new(Domain::FirstFailedAt).string().null())
                    .col(
                        ColumnDef::new(Domain::NameserverMode)
                            .string()
                            .not_null()
                            .default("shared"),
                    )
                    .col(
                        ColumnDef::new(Domain::Nameservers)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(Domain::ExpiresAt).string().null())
                    .col(
                        ColumnDef::new(Domain::DnsSynced)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Domain::LastDeletionWarningDay)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Domain::DeletedAt).string().null())
                    .col(ColumnDef::new(Domain::CreatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        // pending_domains
        manager
            .create_table(
                Table::create()
                    .table(PendingDomain::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PendingDomain::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PendingDomain::FullDomain)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PendingDomain::Status).string().not_null())
                    .col(ColumnDef::new(PendingDomain::FirstFailedAt).string().null())
                    .col(ColumnDef::new(PendingDomain::ExpiresAt).string().null())
                    .col(
                        ColumnDef::new(PendingDomain::LastDeletionWarningDay)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(PendingDomain::CreatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        // dns_records
        manager
            .create_table(
                Table::create()
                    .table(DnsRecord::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DnsRecord::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DnsRecord::DomainId).big_integer().not_null())
                    .col(ColumnDef::new(DnsRecord::Name).string().not_null())
                    .col(ColumnDef::new(DnsRecord::RecordType).string().not_null())
                    .col(ColumnDef::new(DnsRecord::Content).string().not_null())
                    .col(ColumnDef::new(DnsRecord::Ttl).big_integer().not_null())
                    .col(ColumnDef::new(DnsRecord::Priority).integer().null())
                    .col(
                        ColumnDef::new(DnsRecord::Active)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(DnsRecord::Synced)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(DnsRecord::LastSyncError).string().null())
                    .col(ColumnDef::new(DnsRecord::LastSyncedAt).string().null())
                    .col(ColumnDef::new(DnsRecord::CreatedAt).string().not_null())
                    .col(ColumnDef::new(DnsRecord::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_dns_records_domain_name")
                    .table(DnsRecord::Table)
                    .col(DnsRecord::DomainId)
                    .col(DnsRecord::Name)
                    .to_owned(),
            )
            .await?;

        // scan_results
        manager
            .create_table(
                Table::create()
                    .table(ScanResult::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScanResult::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScanResult::DomainId).big_integer().not_null())
                    .col(ColumnDef::new(ScanResult::CheckType).string().not_null())
                    .col(ColumnDef::new(ScanResult::Status).string().not_null())
                    .col(ColumnDef::new(ScanResult::LatencyMs).big_integer().null())
                    .col(ColumnDef::new(ScanResult::ErrorMessage).string().null())
                    .col(ColumnDef::new(ScanResult::Details).string().null())
                    .col(ColumnDef::new(ScanResult::ScannedAt).string().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scan_results_domain")
                    .table(ScanResult::Table)
                    .col(ScanResult::DomainId)
                    .col(ScanResult::Id)
                    .to_owned(),
            )
            .await?;

        // health_summaries
        manager
            .create_table(
                Table::create()
                    .table(HealthSummary::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HealthSummary::DomainId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HealthSummary::Dns).string().not_null())
                    .col(ColumnDef::new(HealthSummary::Http).string().not_null())
                    .col(ColumnDef::new(HealthSummary::Ssl).string().not_null())
                    .col(ColumnDef::new(HealthSummary::SafeBrowsing).string().not_null())
                    .col(ColumnDef::new(HealthSummary::VirusTotal).string().not_null())
                    .col(ColumnDef::new(HealthSummary::HttpStatusCode).integer().null())
                    .col(ColumnDef::new(HealthSummary::ResponseTimeMs).big_integer().null())
                    .col(ColumnDef::new(HealthSummary::SslExpiresAt).string().null())
                    .col(ColumnDef::new(HealthSummary::OverallHealth).string().not_null())
                    .col(
                        ColumnDef::new(HealthSummary::TotalScans)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(HealthSummary::SuccessfulScans)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(HealthSummary::LastScannedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        // api_quotas
        manager
            .create_table(
                Table::create()
                    .table(ApiQuota::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ApiQuota::Service).string().not_null())
                    .col(ColumnDef::new(ApiQuota::Date).string().not_null())
                    .col(
                        ColumnDef::new(ApiQuota::UsedCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ApiQuota::DailyLimit).big_integer().not_null())
                    .primary_key(Index::create().col(ApiQuota::Service).col(ApiQuota::Date))
                    .to_owned(),
            )
            .await?;

        // suspension_history
        manager
            .create_table(
                Table::create()
                    .table(SuspensionHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SuspensionHistory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SuspensionHistory::DomainId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SuspensionHistory::Reason).string().not_null())
                    .col(ColumnDef::new(SuspensionHistory::Details).string().not_null())
                    .col(ColumnDef::new(SuspensionHistory::CreatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SuspensionHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApiQuota::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HealthSummary::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScanResult::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DnsRecord::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PendingDomain::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Domain::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Domain {
    #[sea_orm(iden = "domains")]
    Table,
    Id,
    FullDomain,
    ParentZone,
    Status,
    SuspendReason,
    FirstFailedAt,
    NameserverMode,
    Nameservers,
    ExpiresAt,
    DnsSynced,
    LastDeletionWarningDay,
    DeletedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PendingDomain {
    #[sea_orm(iden = "pending_domains")]
    Table,
    Id,
    FullDomain,
    Status,
    FirstFailedAt,
    ExpiresAt,
    LastDeletionWarningDay,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DnsRecord {
    #[sea_orm(iden = "dns_records")]
    Table,
    Id,
    DomainId,
    Name,
    RecordType,
    Content,
    Ttl,
    Priority,
    Active,
    Synced,
    LastSyncError,
    LastSyncedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ScanResult {
    #[sea_orm(iden = "scan_results")]
    Table,
    Id,
    DomainId,
    CheckType,
    Status,
    LatencyMs,
    ErrorMessage,
    Details,
    ScannedAt,
}

#[derive(DeriveIden)]
enum HealthSummary {
    #[sea_orm(iden = "health_summaries")]
    Table,
    DomainId,
    Dns,
    Http,
    Ssl,
    SafeBrowsing,
    VirusTotal,
    HttpStatusCode,
    ResponseTimeMs,
    SslExpiresAt,
    OverallHealth,
    TotalScans,
    SuccessfulScans,
    LastScannedAt,
}

#[derive(DeriveIden)]
enum ApiQuota {
    #[sea_orm(iden = "api_quotas")]
    Table,
    Service,
    Date,
    UsedCount,
    DailyLimit,
}

#[derive(DeriveIden)]
enum SuspensionHistory {
    #[sea_orm(iden = "suspension_history")]
    Table,
    Id,
    DomainId,
    Reason,
    Details,
    CreatedAt,
}
