//! Zone API backends

/// Shared helpers used by backends and by callers building FQDNs.
pub mod common;

#[cfg(feature = "powerdns")]
mod powerdns;

#[cfg(feature = "powerdns")]
pub use powerdns::{PowerDnsConfig, PowerDnsProvider};
