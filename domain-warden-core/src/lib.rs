//! Domain Warden Core Library
//!
//! The monitoring and reconciliation engine behind a subdomain platform:
//! - Probe and threat-intel checks per domain (scan service)
//! - Health summaries and the suspend/delete/recover lifecycle
//! - DNS reconciliation against an authoritative zone API
//!
//! Storage and notifications are abstracted through traits so the engine can
//! run against SQLite in production and in-memory mocks in tests.

pub mod error;
pub mod services;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::ServiceContext;
pub use traits::{
    Clock, DnsRecordRepository, DomainRepository, Notifier, PendingDomainRepository, Prober,
    QuotaRepository, ScanRepository, SystemClock, ThreatSource,
};
