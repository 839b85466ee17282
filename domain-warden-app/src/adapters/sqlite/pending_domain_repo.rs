//! `PendingDomainRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
};

use domain_warden_core::error::CoreResult;
use domain_warden_core::traits::PendingDomainRepository;
use domain_warden_core::types::{PendingDomain, PendingDomainId};

use super::SqliteStore;
use super::codec::{
    enum_from_string, enum_to_string, limit, optional_timestamp, parse_optional_timestamp,
    parse_timestamp, storage,
};
use super::entity::pending_domain;

impl pending_domain::Model {
    fn into_pending(self) -> CoreResult<PendingDomain> {
        Ok(PendingDomain {
            id: self.id,
            full_domain: self.full_domain,
            status: enum_from_string("status", self.status)?,
            first_failed_at: parse_optional_timestamp("first_failed_at", self.first_failed_at)?,
            expires_at: parse_optional_timestamp("expires_at", self.expires_at)?,
            last_deletion_warning_day: self.last_deletion_warning_day,
            created_at: parse_timestamp("created_at", &self.created_at)?,
        })
    }
}

fn pending_to_active_model(pending: &PendingDomain) -> CoreResult<pending_domain::ActiveModel> {
    Ok(pending_domain::ActiveModel {
        id: Set(pending.id),
        full_domain: Set(pending.full_domain.clone()),
        status: Set(enum_to_string(&pending.status)?),
        first_failed_at: Set(optional_timestamp(pending.first_failed_at)),
        expires_at: Set(optional_timestamp(pending.expires_at)),
        last_deletion_warning_day: Set(pending.last_deletion_warning_day),
        created_at: Set(pending.created_at.to_rfc3339()),
    })
}

#[async_trait]
impl PendingDomainRepository for SqliteStore {
    async fn find_by_id(&self, id: PendingDomainId) -> CoreResult<Option<PendingDomain>> {
        let row = pending_domain::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(storage("query pending domain"))?;

        row.map(pending_domain::Model::into_pending).transpose()
    }

    async fn list_after(
        &self,
        after: Option<PendingDomainId>,
        max: usize,
    ) -> CoreResult<Vec<PendingDomain>> {
        let rows = pending_domain::Entity::find()
            .apply_if(after, |query, after| {
                query.filter(pending_domain::Column::Id.gt(after))
            })
            .order_by_asc(pending_domain::Column::Id)
            .limit(limit(max))
            .all(&self.db)
            .await
            .map_err(storage("list pending domains"))?;

        rows.into_iter()
            .map(pending_domain::Model::into_pending)
            .collect()
    }

    /// Upsert, like `DomainRepository::update`.
    async fn update(&self, pending: &PendingDomain) -> CoreResult<()> {
        pending_domain::Entity::insert(pending_to_active_model(pending)?)
            .on_conflict(
                OnConflict::column(pending_domain::Column::Id)
                    .update_columns([
                        pending_domain::Column::FullDomain,
                        pending_domain::Column::Status,
                        pending_domain::Column::FirstFailedAt,
                        pending_domain::Column::ExpiresAt,
                        pending_domain::Column::LastDeletionWarningDay,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(storage("save pending domain"))?;
        Ok(())
    }

    async fn delete(&self, id: PendingDomainId) -> CoreResult<()> {
        pending_domain::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(storage("delete pending domain"))?;
        Ok(())
    }
}
