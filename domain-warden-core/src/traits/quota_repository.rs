//! API quota persistence abstraction trait

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::CoreResult;
use crate::types::{ApiQuota, ThreatService};

#[async_trait]
pub trait QuotaRepository: Send + Sync {
    async fn find(&self, service: ThreatService, date: NaiveDate) -> CoreResult<Option<ApiQuota>>;

    /// Upsert on `(service, date)`. A stored `used_count` is never lowered:
    /// saves are fire-and-forget and may land out of order.
    async fn save(&self, quota: &ApiQuota) -> CoreResult<()>;
}
