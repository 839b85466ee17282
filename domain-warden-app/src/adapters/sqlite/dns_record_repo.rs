//! `DnsRecordRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

use domain_warden_core::error::{CoreError, CoreResult};
use domain_warden_core::traits::DnsRecordRepository;
use domain_warden_core::types::{DnsRecord, DomainId, RecordId, RecordType};

use super::SqliteStore;
use super::codec::{
    enum_from_string, enum_to_string, optional_timestamp, parse_optional_timestamp,
    parse_timestamp, signed, storage, unsigned,
};
use super::entity::dns_record;

impl dns_record::Model {
    fn into_record(self) -> CoreResult<DnsRecord> {
        Ok(DnsRecord {
            id: self.id,
            domain_id: self.domain_id,
            name: self.name,
            record_type: enum_from_string("record_type", self.record_type)?,
            content: self.content,
            ttl: unsigned(self.ttl),
            priority: self.priority.and_then(|p| u16::try_from(p).ok()),
            active: self.active != 0,
            synced: self.synced != 0,
            last_sync_error: self.last_sync_error,
            last_synced_at: parse_optional_timestamp("last_synced_at", self.last_synced_at)?,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
        })
    }
}

/// Active model for `record`; the id is left unset so inserts get a fresh one.
fn record_to_active_model(record: &DnsRecord) -> CoreResult<dns_record::ActiveModel> {
    Ok(dns_record::ActiveModel {
        id: NotSet,
        domain_id: Set(record.domain_id),
        name: Set(record.name.clone()),
        record_type: Set(enum_to_string(&record.record_type)?),
        content: Set(record.content.clone()),
        ttl: Set(signed(record.ttl)),
        priority: Set(record.priority.map(i32::from)),
        active: Set(i32::from(record.active)),
        synced: Set(i32::from(record.synced)),
        last_sync_error: Set(record.last_sync_error.clone()),
        last_synced_at: Set(optional_timestamp(record.last_synced_at)),
        created_at: Set(record.created_at.to_rfc3339()),
        updated_at: Set(record.updated_at.to_rfc3339()),
    })
}

fn into_records(rows: Vec<dns_record::Model>) -> CoreResult<Vec<DnsRecord>> {
    rows.into_iter().map(dns_record::Model::into_record).collect()
}

#[async_trait]
impl DnsRecordRepository for SqliteStore {
    async fn find_by_id(&self, id: RecordId) -> CoreResult<Option<DnsRecord>> {
        let row = dns_record::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(storage("query record"))?;

        row.map(dns_record::Model::into_record).transpose()
    }

    async fn list_by_domain(&self, domain_id: DomainId) -> CoreResult<Vec<DnsRecord>> {
        let rows = dns_record::Entity::find()
            .filter(dns_record::Column::DomainId.eq(domain_id))
            .order_by_asc(dns_record::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage("list records"))?;

        into_records(rows)
    }

    async fn list_active_group(
        &self,
        domain_id: DomainId,
        name: &str,
        record_type: RecordType,
    ) -> CoreResult<Vec<DnsRecord>> {
        let rows = dns_record::Entity::find()
            .filter(dns_record::Column::DomainId.eq(domain_id))
            .filter(dns_record::Column::Name.eq(name))
            .filter(dns_record::Column::RecordType.eq(enum_to_string(&record_type)?))
            .filter(dns_record::Column::Active.eq(1))
            .order_by_asc(dns_record::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage("list record group"))?;

        into_records(rows)
    }

    async fn list_active_by_name(
        &self,
        domain_id: DomainId,
        name: &str,
    ) -> CoreResult<Vec<DnsRecord>> {
        let rows = dns_record::Entity::find()
            .filter(dns_record::Column::DomainId.eq(domain_id))
            .filter(dns_record::Column::Name.eq(name))
            .filter(dns_record::Column::Active.eq(1))
            .order_by_asc(dns_record::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage("list records by name"))?;

        into_records(rows)
    }

    async fn create(&self, record: &DnsRecord) -> CoreResult<DnsRecord> {
        let model = record_to_active_model(record)?
            .insert(&self.db)
            .await
            .map_err(storage("create record"))?;

        model.into_record()
    }

    async fn update(&self, record: &DnsRecord) -> CoreResult<()> {
        let mut active_model = record_to_active_model(record)?;
        active_model.id = Set(record.id);

        dns_record::Entity::update(active_model)
            .exec(&self.db)
            .await
            .map_err(|e| match e {
                sea_orm::DbErr::RecordNotUpdated => CoreError::RecordNotFound(record.id.to_string()),
                e => CoreError::StorageError(format!("Failed to update record: {e}")),
            })?;
        Ok(())
    }

    async fn mark_synced(&self, ids: &[RecordId], at: DateTime<Utc>) -> CoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        dns_record::Entity::update_many()
            .col_expr(dns_record::Column::Synced, Expr::value(1))
            .col_expr(dns_record::Column::LastSyncError, Expr::value(Option::<String>::None))
            .col_expr(dns_record::Column::LastSyncedAt, Expr::value(at.to_rfc3339()))
            .filter(dns_record::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.db)
            .await
            .map_err(storage("mark records synced"))?;
        Ok(())
    }

    async fn mark_sync_failed(&self, ids: &[RecordId], error: &str) -> CoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        dns_record::Entity::update_many()
            .col_expr(dns_record::Column::Synced, Expr::value(0))
            .col_expr(dns_record::Column::LastSyncError, Expr::value(error))
            .filter(dns_record::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.db)
            .await
            .map_err(storage("mark records failed"))?;
        Ok(())
    }

    async fn count_unsynced_active(&self, domain_id: DomainId) -> CoreResult<u64> {
        dns_record::Entity::find()
            .filter(dns_record::Column::DomainId.eq(domain_id))
            .filter(dns_record::Column::Active.eq(1))
            .filter(dns_record::Column::Synced.eq(0))
            .count(&self.db)
            .await
            .map_err(storage("count unsynced records"))
    }

    async fn delete_by_domain(&self, domain_id: DomainId) -> CoreResult<u64> {
        let result = dns_record::Entity::delete_many()
            .filter(dns_record::Column::DomainId.eq(domain_id))
            .exec(&self.db)
            .await
            .map_err(storage("delete records"))?;

        Ok(result.rows_affected)
    }
}
