//! Shared backend helpers: HTTP client construction and name handling.

use std::time::Duration;

use reqwest::Client;

// ============ HTTP Client ============

/// Default connect timeout (seconds).
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Build an HTTP client with connect and request timeouts.
pub(crate) fn create_http_client(request_timeout: Duration) -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .timeout(request_timeout)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Failed to build configured HTTP client, using defaults: {e}");
            Client::new()
        })
}

// ============ Name handling ============

/// Strip the trailing dot.
pub fn normalize_domain_name(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}

/// Append a trailing dot unless one is present.
///
/// `"example.com"` -> `"example.com."`
pub fn ensure_trailing_dot(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Relative record name to FQDN (no trailing dot).
///
/// `"www"` + `"example.com"` -> `"www.example.com"`,
/// `"@"` or `""` + `"example.com"` -> `"example.com"`
pub fn relative_to_full_name(relative_name: &str, zone_name: &str) -> String {
    let zone = normalize_domain_name(zone_name);
    if relative_name == "@" || relative_name.is_empty() {
        zone
    } else {
        format!("{relative_name}.{zone}")
    }
}

/// FQDN to relative record name. Case-insensitive, trailing dots ignored.
///
/// `"www.example.com."` + `"example.com"` -> `"www"`,
/// `"example.com."` + `"example.com"` -> `"@"`
pub fn full_name_to_relative(full_name: &str, zone_name: &str) -> String {
    let full = normalize_domain_name(full_name).to_ascii_lowercase();
    let zone = normalize_domain_name(zone_name).to_ascii_lowercase();

    if full == zone {
        "@".to_string()
    } else if let Some(subdomain) = full.strip_suffix(&format!(".{zone}")) {
        subdomain.to_string()
    } else {
        full
    }
}

/// Whether `name` equals `fqdn` or is a descendant of it.
pub fn is_name_within(name: &str, fqdn: &str) -> bool {
    let name = normalize_domain_name(name).to_ascii_lowercase();
    let fqdn = normalize_domain_name(fqdn).to_ascii_lowercase();
    name == fqdn || name.ends_with(&format!(".{fqdn}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_dot_added_once() {
        assert_eq!(ensure_trailing_dot("example.com"), "example.com.");
        assert_eq!(ensure_trailing_dot("example.com."), "example.com.");
    }

    #[test]
    fn relative_names_round_trip_through_zone() {
        assert_eq!(relative_to_full_name("@", "x.example."), "x.example");
        assert_eq!(relative_to_full_name("", "x.example"), "x.example");
        assert_eq!(relative_to_full_name("www", "x.example"), "www.x.example");
        assert_eq!(full_name_to_relative("www.x.example.", "x.example"), "www");
        assert_eq!(full_name_to_relative("X.Example.", "x.example"), "@");
        assert_eq!(full_name_to_relative("other.test.", "x.example"), "other.test");
    }

    #[test]
    fn name_within_requires_label_boundary() {
        assert!(is_name_within("x.example.", "x.example"));
        assert!(is_name_within("a.b.x.example.", "x.example"));
        assert!(!is_name_within("ax.example.", "x.example"));
        assert!(!is_name_within("example.", "x.example"));
    }
}
