//! DNS record persistence abstraction trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::types::{DnsRecord, DomainId, RecordId, RecordType};

/// Records owned by domains.
#[async_trait]
pub trait DnsRecordRepository: Send + Sync {
    async fn find_by_id(&self, id: RecordId) -> CoreResult<Option<DnsRecord>>;

    /// Every record of a domain, active or not, ordered by id.
    async fn list_by_domain(&self, domain_id: DomainId) -> CoreResult<Vec<DnsRecord>>;

    /// Active records of one RRset, ordered by id.
    async fn list_active_group(
        &self,
        domain_id: DomainId,
        name: &str,
        record_type: RecordType,
    ) -> CoreResult<Vec<DnsRecord>>;

    /// Active records at a name, any type, ordered by id.
    async fn list_active_by_name(&self, domain_id: DomainId, name: &str) -> CoreResult<Vec<DnsRecord>>;

    /// Insert a record; `record.id` is ignored and the stored row is returned.
    async fn create(&self, record: &DnsRecord) -> CoreResult<DnsRecord>;

    /// Persist every mutable field of `record`.
    async fn update(&self, record: &DnsRecord) -> CoreResult<()>;

    /// `synced = true`, no error, `last_synced_at = at` for every id.
    async fn mark_synced(&self, ids: &[RecordId], at: DateTime<Utc>) -> CoreResult<()>;

    /// `synced = false` with `error` for every id.
    async fn mark_sync_failed(&self, ids: &[RecordId], error: &str) -> CoreResult<()>;

    /// Number of active records still waiting for a successful push.
    async fn count_unsynced_active(&self, domain_id: DomainId) -> CoreResult<u64>;

    /// Remove every record of a domain; returns how many went.
    async fn delete_by_domain(&self, domain_id: DomainId) -> CoreResult<u64>;
}
