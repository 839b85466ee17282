//! `QuotaRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ActiveValue::Set, EntityTrait};

use domain_warden_core::error::{CoreError, CoreResult};
use domain_warden_core::traits::QuotaRepository;
use domain_warden_core::types::{ApiQuota, ThreatService};

use super::SqliteStore;
use super::codec::{enum_from_string, enum_to_string, signed, storage, unsigned};
use super::entity::api_quota;

impl api_quota::Model {
    fn into_quota(self) -> CoreResult<ApiQuota> {
        let date = self
            .date
            .parse::<NaiveDate>()
            .map_err(|e| CoreError::SerializationError(format!("Invalid quota date: {e}")))?;

        Ok(ApiQuota {
            service: enum_from_string("service", self.service)?,
            date,
            used_count: unsigned(self.used_count),
            daily_limit: unsigned(self.daily_limit),
        })
    }
}

#[async_trait]
impl QuotaRepository for SqliteStore {
    async fn find(&self, service: ThreatService, date: NaiveDate) -> CoreResult<Option<ApiQuota>> {
        let row = api_quota::Entity::find_by_id((enum_to_string(&service)?, date.to_string()))
            .one(&self.db)
            .await
            .map_err(storage("query quota"))?;

        row.map(api_quota::Model::into_quota).transpose()
    }

    async fn save(&self, quota: &ApiQuota) -> CoreResult<()> {
        let active_model = api_quota::ActiveModel {
            service: Set(enum_to_string(&quota.service)?),
            date: Set(quota.date.to_string()),
            used_count: Set(signed(quota.used_count)),
            daily_limit: Set(signed(quota.daily_limit)),
        };

        api_quota::Entity::insert(active_model)
            .on_conflict(
                OnConflict::columns([api_quota::Column::Service, api_quota::Column::Date])
                    .value(
                        api_quota::Column::UsedCount,
                        Expr::cust("MAX(used_count, excluded.used_count)"),
                    )
                    .update_column(api_quota::Column::DailyLimit)
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(storage("save quota"))?;
        Ok(())
    }
}
