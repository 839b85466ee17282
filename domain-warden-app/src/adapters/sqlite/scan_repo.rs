//! `ScanRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use domain_warden_core::error::CoreResult;
use domain_warden_core::traits::ScanRepository;
use domain_warden_core::types::{DomainId, HealthSummary, ScanDetails, ScanResult};

use super::SqliteStore;
use super::codec::{
    enum_from_string, enum_to_string, limit, optional_timestamp, parse_optional_timestamp,
    parse_timestamp, signed, storage, unsigned,
};
use super::entity::{health_summary, scan_result};

impl scan_result::Model {
    fn into_result(self) -> CoreResult<ScanResult> {
        let details = self
            .details
            .map(|json| serde_json::from_str::<ScanDetails>(&json))
            .transpose()?;

        Ok(ScanResult {
            id: self.id,
            domain_id: self.domain_id,
            check_type: enum_from_string("check_type", self.check_type)?,
            status: enum_from_string("status", self.status)?,
            latency_ms: self.latency_ms.map(unsigned),
            error_message: self.error_message,
            details,
            scanned_at: parse_timestamp("scanned_at", &self.scanned_at)?,
        })
    }
}

fn result_to_active_model(result: &ScanResult) -> CoreResult<scan_result::ActiveModel> {
    let details = result
        .details
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    Ok(scan_result::ActiveModel {
        id: NotSet,
        domain_id: Set(result.domain_id),
        check_type: Set(enum_to_string(&result.check_type)?),
        status: Set(enum_to_string(&result.status)?),
        latency_ms: Set(result.latency_ms.map(signed)),
        error_message: Set(result.error_message.clone()),
        details: Set(details),
        scanned_at: Set(result.scanned_at.to_rfc3339()),
    })
}

impl health_summary::Model {
    fn into_summary(self) -> CoreResult<HealthSummary> {
        Ok(HealthSummary {
            domain_id: self.domain_id,
            dns: enum_from_string("dns", self.dns)?,
            http: enum_from_string("http", self.http)?,
            ssl: enum_from_string("ssl", self.ssl)?,
            safe_browsing: enum_from_string("safe_browsing", self.safe_browsing)?,
            virus_total: enum_from_string("virus_total", self.virus_total)?,
            http_status_code: self.http_status_code.and_then(|c| u16::try_from(c).ok()),
            response_time_ms: self.response_time_ms.map(unsigned),
            ssl_expires_at: parse_optional_timestamp("ssl_expires_at", self.ssl_expires_at)?,
            overall_health: enum_from_string("overall_health", self.overall_health)?,
            total_scans: unsigned(self.total_scans),
            successful_scans: unsigned(self.successful_scans),
            last_scanned_at: parse_timestamp("last_scanned_at", &self.last_scanned_at)?,
        })
    }
}

fn summary_to_active_model(summary: &HealthSummary) -> CoreResult<health_summary::ActiveModel> {
    Ok(health_summary::ActiveModel {
        domain_id: Set(summary.domain_id),
        dns: Set(enum_to_string(&summary.dns)?),
        http: Set(enum_to_string(&summary.http)?),
        ssl: Set(enum_to_string(&summary.ssl)?),
        safe_browsing: Set(enum_to_string(&summary.safe_browsing)?),
        virus_total: Set(enum_to_string(&summary.virus_total)?),
        http_status_code: Set(summary.http_status_code.map(i32::from)),
        response_time_ms: Set(summary.response_time_ms.map(signed)),
        ssl_expires_at: Set(optional_timestamp(summary.ssl_expires_at)),
        overall_health: Set(enum_to_string(&summary.overall_health)?),
        total_scans: Set(signed(summary.total_scans)),
        successful_scans: Set(signed(summary.successful_scans)),
        last_scanned_at: Set(summary.last_scanned_at.to_rfc3339()),
    })
}

#[async_trait]
impl ScanRepository for SqliteStore {
    async fn insert_results(&self, results: &[ScanResult]) -> CoreResult<()> {
        if results.is_empty() {
            return Ok(());
        }
        let models = results
            .iter()
            .map(result_to_active_model)
            .collect::<CoreResult<Vec<_>>>()?;

        scan_result::Entity::insert_many(models)
            .exec(&self.db)
            .await
            .map_err(storage("insert scan results"))?;
        Ok(())
    }

    async fn recent_results(&self, domain_id: DomainId, max: usize) -> CoreResult<Vec<ScanResult>> {
        let rows = scan_result::Entity::find()
            .filter(scan_result::Column::DomainId.eq(domain_id))
            .order_by_desc(scan_result::Column::Id)
            .limit(limit(max))
            .all(&self.db)
            .await
            .map_err(storage("list scan results"))?;

        rows.into_iter().map(scan_result::Model::into_result).collect()
    }

    async fn find_summary(&self, domain_id: DomainId) -> CoreResult<Option<HealthSummary>> {
        let row = health_summary::Entity::find_by_id(domain_id)
            .one(&self.db)
            .await
            .map_err(storage("query health summary"))?;

        row.map(health_summary::Model::into_summary).transpose()
    }

    async fn save_summary(&self, summary: &HealthSummary) -> CoreResult<()> {
        health_summary::Entity::insert(summary_to_active_model(summary)?)
            .on_conflict(
                OnConflict::column(health_summary::Column::DomainId)
                    .update_columns([
                        health_summary::Column::Dns,
                        health_summary::Column::Http,
                        health_summary::Column::Ssl,
                        health_summary::Column::SafeBrowsing,
                        health_summary::Column::VirusTotal,
                        health_summary::Column::HttpStatusCode,
                        health_summary::Column::ResponseTimeMs,
                        health_summary::Column::SslExpiresAt,
                        health_summary::Column::OverallHealth,
                        health_summary::Column::TotalScans,
                        health_summary::Column::SuccessfulScans,
                        health_summary::Column::LastScannedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(storage("save health summary"))?;
        Ok(())
    }
}
