//! `DomainRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait,
};

use domain_warden_core::error::{CoreError, CoreResult};
use domain_warden_core::traits::DomainRepository;
use domain_warden_core::types::{Domain, DomainId, SuspensionRecord};

use super::SqliteStore;
use super::codec::{
    enum_from_string, enum_to_string, limit, optional_enum_from_string, optional_timestamp,
    parse_optional_timestamp, parse_timestamp, storage,
};
use super::entity::{domain, suspension};

impl domain::Model {
    /// Convert a `SeaORM` row model into a `Domain`.
    fn into_domain(self) -> CoreResult<Domain> {
        let nameservers: Vec<String> = serde_json::from_str(&self.nameservers)
            .map_err(|e| CoreError::SerializationError(format!("Invalid nameservers JSON: {e}")))?;

        Ok(Domain {
            id: self.id,
            full_domain: self.full_domain,
            parent_zone: self.parent_zone,
            status: enum_from_string("status", self.status)?,
            suspend_reason: optional_enum_from_string("suspend_reason", self.suspend_reason)?,
            first_failed_at: parse_optional_timestamp("first_failed_at", self.first_failed_at)?,
            nameserver_mode: enum_from_string("nameserver_mode", self.nameserver_mode)?,
            nameservers,
            expires_at: parse_optional_timestamp("expires_at", self.expires_at)?,
            dns_synced: self.dns_synced != 0,
            last_deletion_warning_day: self.last_deletion_warning_day,
            deleted_at: parse_optional_timestamp("deleted_at", self.deleted_at)?,
            created_at: parse_timestamp("created_at", &self.created_at)?,
        })
    }
}

/// Convert a `Domain` into a `SeaORM` active model for upsert.
fn domain_to_active_model(domain: &Domain) -> CoreResult<domain::ActiveModel> {
    let nameservers = serde_json::to_string(&domain.nameservers)
        .map_err(|e| CoreError::SerializationError(e.to_string()))?;

    Ok(domain::ActiveModel {
        id: Set(domain.id),
        full_domain: Set(domain.full_domain.clone()),
        parent_zone: Set(domain.parent_zone.clone()),
        status: Set(enum_to_string(&domain.status)?),
        suspend_reason: Set(domain.suspend_reason.as_ref().map(enum_to_string).transpose()?),
        first_failed_at: Set(optional_timestamp(domain.first_failed_at)),
        nameserver_mode: Set(enum_to_string(&domain.nameserver_mode)?),
        nameservers: Set(nameservers),
        expires_at: Set(optional_timestamp(domain.expires_at)),
        dns_synced: Set(i32::from(domain.dns_synced)),
        last_deletion_warning_day: Set(domain.last_deletion_warning_day),
        deleted_at: Set(optional_timestamp(domain.deleted_at)),
        created_at: Set(domain.created_at.to_rfc3339()),
    })
}

impl suspension::Model {
    fn into_record(self) -> CoreResult<SuspensionRecord> {
        Ok(SuspensionRecord {
            domain_id: self.domain_id,
            reason: enum_from_string("reason", self.reason)?,
            details: self.details,
            created_at: parse_timestamp("created_at", &self.created_at)?,
        })
    }
}

#[async_trait]
impl DomainRepository for SqliteStore {
    async fn find_by_id(&self, id: DomainId) -> CoreResult<Option<Domain>> {
        let row = domain::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(storage("query domain"))?;

        row.map(domain::Model::into_domain).transpose()
    }

    async fn list_live_after(
        &self,
        after: Option<DomainId>,
        max: usize,
    ) -> CoreResult<Vec<Domain>> {
        let rows = domain::Entity::find()
            .filter(domain::Column::DeletedAt.is_null())
            .apply_if(after, |query, after| {
                query.filter(domain::Column::Id.gt(after))
            })
            .order_by_asc(domain::Column::Id)
            .limit(limit(max))
            .all(&self.db)
            .await
            .map_err(storage("list domains"))?;

        rows.into_iter().map(domain::Model::into_domain).collect()
    }

    /// Upsert; the CRUD layer creates rows through the same path.
    async fn update(&self, domain: &Domain) -> CoreResult<()> {
        let active_model = domain_to_active_model(domain)?;

        domain::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(domain::Column::Id)
                    .update_columns([
                        domain::Column::FullDomain,
                        domain::Column::ParentZone,
                        domain::Column::Status,
                        domain::Column::SuspendReason,
                        domain::Column::FirstFailedAt,
                        domain::Column::NameserverMode,
                        domain::Column::Nameservers,
                        domain::Column::ExpiresAt,
                        domain::Column::DnsSynced,
                        domain::Column::LastDeletionWarningDay,
                        domain::Column::DeletedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(storage("save domain"))?;

        Ok(())
    }

    async fn save_lifecycle_state(&self, domain: &Domain) -> CoreResult<()> {
        let suspend_reason = domain
            .suspend_reason
            .as_ref()
            .map(enum_to_string)
            .transpose()?;

        domain::Entity::update_many()
            .col_expr(domain::Column::Status, Expr::value(enum_to_string(&domain.status)?))
            .col_expr(domain::Column::SuspendReason, Expr::value(suspend_reason))
            .col_expr(
                domain::Column::FirstFailedAt,
                Expr::value(optional_timestamp(domain.first_failed_at)),
            )
            .col_expr(
                domain::Column::LastDeletionWarningDay,
                Expr::value(domain.last_deletion_warning_day),
            )
            .filter(domain::Column::Id.eq(domain.id))
            .filter(domain::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(storage("save lifecycle state"))?;
        Ok(())
    }

    async fn set_dns_synced(&self, id: DomainId, synced: bool) -> CoreResult<()> {
        domain::Entity::update_many()
            .col_expr(domain::Column::DnsSynced, Expr::value(i32::from(synced)))
            .filter(domain::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(storage("update dns_synced"))?;
        Ok(())
    }

    async fn tombstone(&self, id: DomainId, at: DateTime<Utc>) -> CoreResult<()> {
        domain::Entity::update_many()
            .col_expr(domain::Column::DeletedAt, Expr::value(at.to_rfc3339()))
            .filter(domain::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(storage("tombstone domain"))?;
        Ok(())
    }

    async fn record_suspension(&self, record: &SuspensionRecord) -> CoreResult<()> {
        suspension::ActiveModel {
            id: NotSet,
            domain_id: Set(record.domain_id),
            reason: Set(enum_to_string(&record.reason)?),
            details: Set(record.details.clone()),
            created_at: Set(record.created_at.to_rfc3339()),
        }
        .insert(&self.db)
        .await
        .map_err(storage("record suspension"))?;
        Ok(())
    }

    async fn list_suspensions(&self, domain_id: DomainId) -> CoreResult<Vec<SuspensionRecord>> {
        let rows = suspension::Entity::find()
            .filter(suspension::Column::DomainId.eq(domain_id))
            .order_by_asc(suspension::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage("list suspensions"))?;

        rows.into_iter().map(suspension::Model::into_record).collect()
    }
}
