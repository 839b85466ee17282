//! Folds one scan cycle into a domain's health summary.

use chrono::{DateTime, Utc};

use crate::types::{
    CheckOutcome, CheckStatus, CheckType, DnsHealth, DomainId, HealthSummary, HttpHealth,
    OverallHealth, SafeBrowsingVerdict, ScanDetails, SslHealth, VirusTotalVerdict,
};

/// Pure mapping from check outcomes to normalized health.
pub struct HealthAggregator;

impl HealthAggregator {
    /// Build the new summary for a cycle, carrying the counters of `previous`.
    pub fn summarize(
        domain_id: DomainId,
        previous: Option<&HealthSummary>,
        outcomes: &[CheckOutcome],
        scanned_at: DateTime<Utc>,
    ) -> HealthSummary {
        let find = |check_type: CheckType| outcomes.iter().find(|o| o.check_type == check_type);

        let dns_outcome = find(CheckType::Dns);
        let http_outcome = find(CheckType::Http);
        let tls_outcome = find(CheckType::Ssl);

        let dns = Self::dns_health(dns_outcome);
        let http = Self::http_health(http_outcome);
        let ssl = Self::ssl_health(tls_outcome);
        let safe_browsing = Self::safe_browsing_verdict(find(CheckType::SafeBrowsing));
        let virus_total = Self::virus_total_verdict(find(CheckType::VirusTotal));

        let http_status_code = http_outcome.and_then(|o| match o.details {
            Some(ScanDetails::Http { status_code }) => Some(status_code),
            _ => None,
        });
        let response_time_ms = http_outcome
            .filter(|o| o.is_success())
            .and_then(|o| o.latency_ms);
        let ssl_expires_at = tls_outcome.and_then(|o| match o.details {
            Some(ScanDetails::Tls { not_after, .. }) => Some(not_after),
            _ => None,
        });

        let (total, successful) =
            previous.map_or((0, 0), |p| (p.total_scans, p.successful_scans));

        HealthSummary {
            domain_id,
            dns,
            http,
            ssl,
            safe_browsing,
            virus_total,
            http_status_code,
            response_time_ms,
            ssl_expires_at,
            overall_health: Self::classify(dns, http, safe_browsing, virus_total),
            total_scans: total + 1,
            successful_scans: successful + u64::from(http == HttpHealth::Online),
            last_scanned_at: scanned_at,
        }
    }

    /// Threat verdicts dominate; otherwise the DNS/HTTP pair decides.
    pub fn classify(
        dns: DnsHealth,
        http: HttpHealth,
        safe_browsing: SafeBrowsingVerdict,
        virus_total: VirusTotalVerdict,
    ) -> OverallHealth {
        if safe_browsing == SafeBrowsingVerdict::Unsafe
            || virus_total == VirusTotalVerdict::Malicious
        {
            return OverallHealth::Degraded;
        }
        match (dns, http) {
            (DnsHealth::Resolved, HttpHealth::Online) => OverallHealth::Healthy,
            (DnsHealth::Resolved, _) | (_, HttpHealth::Online) => OverallHealth::Degraded,
            _ => OverallHealth::Down,
        }
    }

    fn dns_health(outcome: Option<&CheckOutcome>) -> DnsHealth {
        match outcome {
            Some(o) if o.is_success() => DnsHealth::Resolved,
            _ => DnsHealth::Failed,
        }
    }

    fn http_health(outcome: Option<&CheckOutcome>) -> HttpHealth {
        match outcome {
            Some(o) if o.is_success() => HttpHealth::Online,
            _ => HttpHealth::Offline,
        }
    }

    fn ssl_health(outcome: Option<&CheckOutcome>) -> SslHealth {
        match outcome {
            None => SslHealth::None,
            Some(o) if o.is_success() => match o.details {
                Some(ScanDetails::Tls { valid: false, .. }) => SslHealth::Invalid,
                _ => SslHealth::Valid,
            },
            Some(_) => SslHealth::Invalid,
        }
    }

    fn safe_browsing_verdict(outcome: Option<&CheckOutcome>) -> SafeBrowsingVerdict {
        match outcome.map(|o| o.status) {
            Some(CheckStatus::ThreatDetected) => SafeBrowsingVerdict::Unsafe,
            Some(CheckStatus::Success) => SafeBrowsingVerdict::Safe,
            _ => SafeBrowsingVerdict::Unknown,
        }
    }

    fn virus_total_verdict(outcome: Option<&CheckOutcome>) -> VirusTotalVerdict {
        let Some(outcome) = outcome else {
            return VirusTotalVerdict::Unknown;
        };
        match outcome.status {
            CheckStatus::ThreatDetected => VirusTotalVerdict::Malicious,
            CheckStatus::Success => match outcome.details {
                Some(ScanDetails::VirusTotal { stats }) if stats.suspicious > 0 => {
                    VirusTotalVerdict::Suspicious
                }
                _ => VirusTotalVerdict::Clean,
            },
            CheckStatus::NotFound => VirusTotalVerdict::Clean,
            CheckStatus::Failed | CheckStatus::QuotaExceeded => VirusTotalVerdict::Unknown,
        }
    }
}
