//! `SeaORM` entity for the `domains` table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "domains")]
/// Database row model for a registered domain.
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    #[sea_orm(unique)]
    pub full_domain: String,
    pub parent_zone: String,
    pub status: String,
    pub suspend_reason: Option<String>,
    pub first_failed_at: Option<String>,
    pub nameserver_mode: String,
    /// JSON array of host names.
    pub nameservers: String,
    pub expires_at: Option<String>,
    pub dns_synced: i32,
    pub last_deletion_warning_day: Option<i64>,
    pub deleted_at: Option<String>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
