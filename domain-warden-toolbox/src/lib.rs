//! Reachability probes for Domain Warden
//!
//! Three independent checks against a domain name: DNS resolution, a plain-HTTP
//! GET that does not follow redirects, and a TLS handshake that inspects the leaf
//! certificate without validating the trust chain. Every probe is bounded by a
//! timeout and reports failure inside its result instead of returning `Err`, so
//! one failing check never prevents the others from running.

mod error;
mod services;
mod types;

pub use error::{ToolboxError, ToolboxResult};
pub use services::{ProbeService, validate_domain};
pub use types::{DnsProbeResult, HttpProbeResult, LeafCertificate, ProbeOptions, TlsProbeResult};
