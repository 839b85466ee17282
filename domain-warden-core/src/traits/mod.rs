//! Storage, probe and notification abstractions

mod clock;
mod dns_record_repository;
mod domain_repository;
mod notifier;
mod prober;
mod quota_repository;
mod scan_repository;
mod threat_source;

pub use clock::{Clock, SystemClock};
pub use dns_record_repository::DnsRecordRepository;
pub use domain_repository::{DomainRepository, PendingDomainRepository};
pub use notifier::{Notifier, NoopNotifier};
pub use prober::Prober;
pub use quota_repository::QuotaRepository;
pub use scan_repository::ScanRepository;
pub use threat_source::ThreatSource;
