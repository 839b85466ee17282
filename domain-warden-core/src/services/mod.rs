//! Business logic service layer

mod detached;
mod dns_reconciler;
mod health_aggregator;
mod lifecycle;
mod probe;
mod scan_service;
pub mod threat_intel;

pub use detached::DetachedTasks;
pub use dns_reconciler::DnsReconciler;
pub use health_aggregator::HealthAggregator;
pub use lifecycle::{
    DomainState, LifecycleService, PendingTransition, Transition, decide, decide_pending,
};
pub use probe::NetworkProber;
pub use scan_service::{ScanCycleReport, ScanService};
pub use threat_intel::{QuotaTracker, ThreatIntelGateway};

use std::sync::Arc;

use domain_warden_provider::ZoneProvider;

use crate::error::CoreError;
use crate::traits::{
    Clock, DnsRecordRepository, DomainRepository, Notifier, PendingDomainRepository, Prober,
    QuotaRepository, ScanRepository,
};

/// Service context: holds every dependency.
///
/// The platform layer builds it and injects its storage, zone API and
/// notification implementations.
pub struct ServiceContext {
    pub domain_repository: Arc<dyn DomainRepository>,
    pub pending_domain_repository: Arc<dyn PendingDomainRepository>,
    pub dns_record_repository: Arc<dyn DnsRecordRepository>,
    pub scan_repository: Arc<dyn ScanRepository>,
    pub quota_repository: Arc<dyn QuotaRepository>,
    /// Authoritative DNS server API
    pub zone_provider: Arc<dyn ZoneProvider>,
    pub prober: Arc<dyn Prober>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

/// Log an error at `warn` when it is expected, `error` otherwise.
pub(crate) fn log_core_error(context: &str, error: &CoreError) {
    if error.is_expected() {
        log::warn!("{context}: {error}");
    } else {
        log::error!("{context}: {error}");
    }
}
