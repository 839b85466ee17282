//! Domain persistence abstraction traits

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::types::{Domain, DomainId, PendingDomain, PendingDomainId, SuspensionRecord};

/// Registered domains, written by the CRUD layer and the lifecycle engine.
///
/// Implementations:
/// - `SqliteStore` (`domain-warden-app`, sea-orm)
#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// Find a domain by id, tombstoned or not.
    async fn find_by_id(&self, id: DomainId) -> CoreResult<Option<Domain>>;

    /// Non-tombstoned domains with `id > after`, ordered by id.
    ///
    /// Keyset pagination keeps batches stable while earlier domains are
    /// tombstoned mid-cycle.
    async fn list_live_after(&self, after: Option<DomainId>, limit: usize) -> CoreResult<Vec<Domain>>;

    /// Persist every mutable field of `domain`.
    async fn update(&self, domain: &Domain) -> CoreResult<()>;

    /// Persist only the lifecycle columns (`status`, `suspend_reason`,
    /// `first_failed_at`, `last_deletion_warning_day`) of a live domain.
    ///
    /// Tombstoned or missing rows are left untouched, so a concurrent CRUD
    /// deletion always wins.
    async fn save_lifecycle_state(&self, domain: &Domain) -> CoreResult<()>;

    /// Set the `dns_synced` roll-up flag.
    async fn set_dns_synced(&self, id: DomainId, synced: bool) -> CoreResult<()>;

    /// Mark the domain deleted at `at`.
    async fn tombstone(&self, id: DomainId, at: DateTime<Utc>) -> CoreResult<()>;

    /// Append to the suspension audit trail.
    async fn record_suspension(&self, record: &SuspensionRecord) -> CoreResult<()>;

    /// Suspension history of a domain, oldest first.
    async fn list_suspensions(&self, domain_id: DomainId) -> CoreResult<Vec<SuspensionRecord>>;
}

/// Pending domain reservations.
#[async_trait]
pub trait PendingDomainRepository: Send + Sync {
    async fn find_by_id(&self, id: PendingDomainId) -> CoreResult<Option<PendingDomain>>;

    /// Reservations with `id > after`, ordered by id.
    async fn list_after(
        &self,
        after: Option<PendingDomainId>,
        limit: usize,
    ) -> CoreResult<Vec<PendingDomain>>;

    async fn update(&self, pending: &PendingDomain) -> CoreResult<()>;

    /// Drop the reservation so the name becomes available again.
    async fn delete(&self, id: PendingDomainId) -> CoreResult<()>;
}
