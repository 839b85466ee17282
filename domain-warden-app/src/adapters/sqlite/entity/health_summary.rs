//! `SeaORM` entity for the `health_summaries` table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "health_summaries")]
/// One row per domain, overwritten every scan.
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub domain_id: i64,
    pub dns: String,
    pub http: String,
    pub ssl: String,
    pub safe_browsing: String,
    pub virus_total: String,
    pub http_status_code: Option<i32>,
    pub response_time_ms: Option<i64>,
    pub ssl_expires_at: Option<String>,
    pub overall_health: String,
    pub total_scans: i64,
    pub successful_scans: i64,
    pub last_scanned_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
