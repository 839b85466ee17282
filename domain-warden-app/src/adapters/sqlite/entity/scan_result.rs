//! `SeaORM` entity for the `scan_results` table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "scan_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub domain_id: i64,
    pub check_type: String,
    pub status: String,
    pub latency_ms: Option<i64>,
    pub error_message: Option<String>,
    /// JSON-encoded `ScanDetails`.
    pub details: Option<String>,
    pub scanned_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
