//! Scan result and health summary persistence abstraction trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{DomainId, HealthSummary, ScanResult};

#[async_trait]
pub trait ScanRepository: Send + Sync {
    /// Append one cycle's check rows.
    async fn insert_results(&self, results: &[ScanResult]) -> CoreResult<()>;

    /// Most recent rows of a domain, newest first.
    async fn recent_results(&self, domain_id: DomainId, limit: usize) -> CoreResult<Vec<ScanResult>>;

    async fn find_summary(&self, domain_id: DomainId) -> CoreResult<Option<HealthSummary>>;

    /// Insert or replace the domain's single summary row.
    async fn save_summary(&self, summary: &HealthSummary) -> CoreResult<()>;
}
