//! # domain-warden-provider
//!
//! Client library for the management API of an authoritative DNS server.
//!
//! The crate speaks in zones and RRsets: a zone is created, read, deleted, and
//! patched with a list of [`RrsetChange`]s, each of which fully replaces or removes
//! one `(name, type)` record set. All names sent over the wire are fully qualified
//! and dot-terminated.
//!
//! ## Supported Backends
//!
//! | Backend | Feature Flag | Auth Method |
//! |---------|-------------|-------------|
//! | [PowerDNS Authoritative](https://doc.powerdns.com/authoritative/http-api/) | `powerdns` | `X-API-Key` header |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use domain_warden_provider::{
//!     PowerDnsConfig, PowerDnsProvider, RecordType, ResourceRecord, RrsetChange, ZoneProvider,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = PowerDnsProvider::new(PowerDnsConfig {
//!         api_url: "http://127.0.0.1:8081".to_string(),
//!         api_key: "secret".to_string(),
//!         ..PowerDnsConfig::default()
//!     });
//!
//!     let change = RrsetChange::replace(
//!         "www.example.com.",
//!         RecordType::A,
//!         3600,
//!         vec![ResourceRecord::new("192.0.2.10")],
//!     );
//!     provider.patch_rrsets("example.com.", &[change]).await?;
//!
//!     let zone = provider.get_zone("example.com.").await?;
//!     for rrset in &zone.rrsets {
//!         println!("{} {} ({} records)", rrset.name, rrset.record_type, rrset.records.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`Result<T, ProviderError>`](ProviderError). Transient
//! failures (`NetworkError`, `Timeout`, `RateLimited`) are retried with exponential
//! backoff. Zone conflicts surface as [`ProviderError::ZoneExists`] and
//! [`ProviderError::ZoneNotFound`] so callers can treat them as benign where the
//! operation is idempotent.

mod error;
mod http_client;
mod providers;
mod traits;
mod types;
mod utils;

pub use error::{ProviderError, Result};

pub use traits::ZoneProvider;

pub use types::{ChangeType, RecordType, ResourceRecord, Rrset, RrsetChange, Zone, ZoneKind};

pub use providers::common::{
    ensure_trailing_dot, full_name_to_relative, is_name_within, normalize_domain_name,
    relative_to_full_name,
};

pub use utils::log_sanitizer;

#[cfg(feature = "powerdns")]
pub use providers::{PowerDnsConfig, PowerDnsProvider};
