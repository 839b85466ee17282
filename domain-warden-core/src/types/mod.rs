//! Type definitions

mod config;
mod dns;
mod domain;
mod health;
mod notification;
mod quota;
mod scan;

pub use config::{
    LifecyclePolicy, SafeBrowsingConfig, ScannerConfig, ThreatIntelConfig, VirusTotalConfig,
};
pub use dns::{
    DEFAULT_MX_PRIORITY, DEFAULT_TTL, DnsRecord, NewDnsRecord, PullSyncStats, RecordGroupKey,
    RecordId, RecordType,
};
pub use domain::{
    Domain, DomainId, DomainStatus, NameserverMode, PendingDomain, PendingDomainId,
    PendingStatus, SuspendReason, SuspensionRecord,
};
pub use health::{
    DnsHealth, HealthReport, HealthSummary, HttpHealth, OverallHealth, SafeBrowsingVerdict,
    SslHealth, VirusTotalVerdict,
};
pub use notification::{Notification, NotificationKind, NotificationPriority};
pub use quota::{ApiQuota, QuotaStatus, ThreatService};
pub use scan::{
    AnalysisStats, CheckOutcome, CheckStatus, CheckType, ScanDetails, ScanResult, ThreatMatch,
};
