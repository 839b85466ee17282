//! Test helpers: in-memory mocks and fixtures.

#![allow(dead_code, clippy::new_without_default, clippy::unwrap_used)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use tokio::sync::RwLock;

use domain_warden_provider::{
    ChangeType, ProviderError, RecordType, ResourceRecord, Rrset, RrsetChange, Zone, ZoneProvider,
};

use crate::error::CoreResult;
use crate::services::ServiceContext;
use crate::traits::{
    Clock, DnsRecordRepository, DomainRepository, Notifier, PendingDomainRepository, Prober,
    QuotaRepository, ScanRepository, ThreatSource,
};
use crate::types::{
    AnalysisStats, ApiQuota, CheckOutcome, CheckStatus, CheckType, DnsRecord, Domain, DomainId,
    HealthSummary, Notification, NotificationKind, PendingDomain, PendingDomainId, RecordId,
    ScanDetails, ScanResult, SuspensionRecord, ThreatMatch, ThreatService,
};

pub const PARENT_ZONE: &str = "example.net.";

/// Start of every test timeline.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Shared-mode domain `{label}.example.net`.
pub fn domain(id: DomainId, label: &str) -> Domain {
    Domain::new(id, format!("{label}.example.net"), "example.net", t0())
}

/// Active, unsynced record.
pub fn record(
    domain_id: DomainId,
    name: &str,
    record_type: RecordType,
    content: &str,
) -> DnsRecord {
    DnsRecord {
        id: 0,
        domain_id,
        name: name.to_string(),
        record_type,
        content: content.to_string(),
        ttl: 3600,
        priority: None,
        active: true,
        synced: false,
        last_sync_error: None,
        last_synced_at: None,
        created_at: t0(),
        updated_at: t0(),
    }
}

pub fn rrset(name: &str, record_type: RecordType, contents: &[&str]) -> Rrset {
    Rrset {
        name: name.to_string(),
        record_type,
        ttl: 3600,
        records: contents.iter().map(|c| ResourceRecord::new(*c)).collect(),
    }
}

/// Poll `probe` until it yields a value, giving spawned tasks a chance to run.
pub async fn wait_until<T, F, Fut>(mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for _ in 0..100 {
        if let Some(value) = probe().await {
            return Some(value);
        }
        tokio::task::yield_now().await;
    }
    None
}

// ===== FixedClock =====

pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ===== MockStore =====

/// Every repository trait over in-memory maps.
pub struct MockStore {
    domains: RwLock<BTreeMap<DomainId, Domain>>,
    pending: RwLock<BTreeMap<PendingDomainId, PendingDomain>>,
    records: RwLock<BTreeMap<RecordId, DnsRecord>>,
    next_record_id: AtomicI64,
    scan_results: RwLock<Vec<ScanResult>>,
    summaries: RwLock<HashMap<DomainId, HealthSummary>>,
    quotas: RwLock<HashMap<(ThreatService, NaiveDate), ApiQuota>>,
    suspensions: RwLock<Vec<SuspensionRecord>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            domains: RwLock::new(BTreeMap::new()),
            pending: RwLock::new(BTreeMap::new()),
            records: RwLock::new(BTreeMap::new()),
            next_record_id: AtomicI64::new(1),
            scan_results: RwLock::new(Vec::new()),
            summaries: RwLock::new(HashMap::new()),
            quotas: RwLock::new(HashMap::new()),
            suspensions: RwLock::new(Vec::new()),
        }
    }

    pub async fn insert_domain(&self, domain: Domain) {
        self.domains.write().await.insert(domain.id, domain);
    }

    pub async fn insert_pending(&self, pending: PendingDomain) {
        self.pending.write().await.insert(pending.id, pending);
    }

    /// Store a record under a fresh id and return it.
    pub async fn insert_record(&self, mut record: DnsRecord) -> DnsRecord {
        record.id = self.next_record_id.fetch_add(1, Ordering::SeqCst);
        self.records.write().await.insert(record.id, record.clone());
        record
    }

    pub async fn domain(&self, id: DomainId) -> Option<Domain> {
        self.domains.read().await.get(&id).cloned()
    }

    pub async fn pending(&self, id: PendingDomainId) -> Option<PendingDomain> {
        self.pending.read().await.get(&id).cloned()
    }

    pub async fn record(&self, id: RecordId) -> Option<DnsRecord> {
        self.records.read().await.get(&id).cloned()
    }

    pub async fn records_of(&self, domain_id: DomainId) -> Vec<DnsRecord> {
        self.records
            .read()
            .await
            .values()
            .filter(|r| r.domain_id == domain_id)
            .cloned()
            .collect()
    }

    pub async fn results_of(&self, domain_id: DomainId) -> Vec<ScanResult> {
        self.scan_results
            .read()
            .await
            .iter()
            .filter(|r| r.domain_id == domain_id)
            .cloned()
            .collect()
    }

    pub async fn summary(&self, domain_id: DomainId) -> Option<HealthSummary> {
        self.summaries.read().await.get(&domain_id).cloned()
    }

    pub async fn suspensions(&self) -> Vec<SuspensionRecord> {
        self.suspensions.read().await.clone()
    }
}

#[async_trait]
impl DomainRepository for MockStore {
    async fn find_by_id(&self, id: DomainId) -> CoreResult<Option<Domain>> {
        Ok(self.domain(id).await)
    }

    async fn list_live_after(&self, after: Option<DomainId>, limit: usize) -> CoreResult<Vec<Domain>> {
        Ok(self
            .domains
            .read()
            .await
            .values()
            .filter(|d| d.deleted_at.is_none() && after.is_none_or(|a| d.id > a))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update(&self, domain: &Domain) -> CoreResult<()> {
        self.domains.write().await.insert(domain.id, domain.clone());
        Ok(())
    }

    async fn save_lifecycle_state(&self, domain: &Domain) -> CoreResult<()> {
        if let Some(d) = self
            .domains
            .write()
            .await
            .get_mut(&domain.id)
            .filter(|d| d.deleted_at.is_none())
        {
            d.status = domain.status;
            d.suspend_reason = domain.suspend_reason;
            d.first_failed_at = domain.first_failed_at;
            d.last_deletion_warning_day = domain.last_deletion_warning_day;
        }
        Ok(())
    }

    async fn set_dns_synced(&self, id: DomainId, synced: bool) -> CoreResult<()> {
        if let Some(d) = self.domains.write().await.get_mut(&id) {
            d.dns_synced = synced;
        }
        Ok(())
    }

    async fn tombstone(&self, id: DomainId, at: DateTime<Utc>) -> CoreResult<()> {
        if let Some(d) = self.domains.write().await.get_mut(&id) {
            d.deleted_at = Some(at);
        }
        Ok(())
    }

    async fn record_suspension(&self, record: &SuspensionRecord) -> CoreResult<()> {
        self.suspensions.write().await.push(record.clone());
        Ok(())
    }

    async fn list_suspensions(&self, domain_id: DomainId) -> CoreResult<Vec<SuspensionRecord>> {
        Ok(self
            .suspensions
            .read()
            .await
            .iter()
            .filter(|s| s.domain_id == domain_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PendingDomainRepository for MockStore {
    async fn find_by_id(&self, id: PendingDomainId) -> CoreResult<Option<PendingDomain>> {
        Ok(self.pending(id).await)
    }

    async fn list_after(
        &self,
        after: Option<PendingDomainId>,
        limit: usize,
    ) -> CoreResult<Vec<PendingDomain>> {
        Ok(self
            .pending
            .read()
            .await
            .values()
            .filter(|p| after.is_none_or(|a| p.id > a))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update(&self, pending: &PendingDomain) -> CoreResult<()> {
        self.pending.write().await.insert(pending.id, pending.clone());
        Ok(())
    }

    async fn delete(&self, id: PendingDomainId) -> CoreResult<()> {
        self.pending.write().await.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl DnsRecordRepository for MockStore {
    async fn find_by_id(&self, id: RecordId) -> CoreResult<Option<DnsRecord>> {
        Ok(self.record(id).await)
    }

    async fn list_by_domain(&self, domain_id: DomainId) -> CoreResult<Vec<DnsRecord>> {
        Ok(self.records_of(domain_id).await)
    }

    async fn list_active_group(
        &self,
        domain_id: DomainId,
        name: &str,
        record_type: RecordType,
    ) -> CoreResult<Vec<DnsRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| {
                r.domain_id == domain_id && r.active && r.name == name && r.record_type == record_type
            })
            .cloned()
            .collect())
    }

    async fn list_active_by_name(&self, domain_id: DomainId, name: &str) -> CoreResult<Vec<DnsRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.domain_id == domain_id && r.active && r.name == name)
            .cloned()
            .collect())
    }

    async fn create(&self, record: &DnsRecord) -> CoreResult<DnsRecord> {
        Ok(self.insert_record(record.clone()).await)
    }

    async fn update(&self, record: &DnsRecord) -> CoreResult<()> {
        self.records.write().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn mark_synced(&self, ids: &[RecordId], at: DateTime<Utc>) -> CoreResult<()> {
        let mut records = self.records.write().await;
        for id in ids {
            if let Some(r) = records.get_mut(id) {
                r.synced = true;
                r.last_sync_error = None;
                r.last_synced_at = Some(at);
            }
        }
        Ok(())
    }

    async fn mark_sync_failed(&self, ids: &[RecordId], error: &str) -> CoreResult<()> {
        let mut records = self.records.write().await;
        for id in ids {
            if let Some(r) = records.get_mut(id) {
                r.synced = false;
                r.last_sync_error = Some(error.to_string());
            }
        }
        Ok(())
    }

    async fn count_unsynced_active(&self, domain_id: DomainId) -> CoreResult<u64> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.domain_id == domain_id && r.active && !r.synced)
            .count() as u64)
    }

    async fn delete_by_domain(&self, domain_id: DomainId) -> CoreResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.domain_id != domain_id);
        Ok((before - records.len()) as u64)
    }
}

#[async_trait]
impl ScanRepository for MockStore {
    async fn insert_results(&self, results: &[ScanResult]) -> CoreResult<()> {
        let mut rows = self.scan_results.write().await;
        for result in results {
            let mut row = result.clone();
            row.id = i64::try_from(rows.len()).unwrap_or_default() + 1;
            rows.push(row);
        }
        Ok(())
    }

    async fn recent_results(&self, domain_id: DomainId, limit: usize) -> CoreResult<Vec<ScanResult>> {
        let mut rows = self.results_of(domain_id).await;
        rows.reverse();
        rows.truncate(limit);
        Ok(rows)
    }

    async fn find_summary(&self, domain_id: DomainId) -> CoreResult<Option<HealthSummary>> {
        Ok(self.summary(domain_id).await)
    }

    async fn save_summary(&self, summary: &HealthSummary) -> CoreResult<()> {
        self.summaries
            .write()
            .await
            .insert(summary.domain_id, summary.clone());
        Ok(())
    }
}

#[async_trait]
impl QuotaRepository for MockStore {
    async fn find(&self, service: ThreatService, date: NaiveDate) -> CoreResult<Option<ApiQuota>> {
        Ok(self.quotas.read().await.get(&(service, date)).cloned())
    }

    async fn save(&self, quota: &ApiQuota) -> CoreResult<()> {
        let mut quotas = self.quotas.write().await;
        let entry = quotas
            .entry((quota.service, quota.date))
            .or_insert_with(|| quota.clone());
        entry.used_count = entry.used_count.max(quota.used_count);
        entry.daily_limit = quota.daily_limit;
        Ok(())
    }
}

// ===== MockZoneProvider =====

/// Zone API over in-memory zones; PATCHes are applied and logged.
pub struct MockZoneProvider {
    zones: RwLock<HashMap<String, Zone>>,
    patches: RwLock<Vec<(String, Vec<RrsetChange>)>>,
    created: RwLock<Vec<(String, Vec<String>)>>,
    deleted: RwLock<Vec<String>>,
    /// PATCHes touching one of these owner names fail with a network error.
    failing_names: RwLock<HashSet<String>>,
}

impl MockZoneProvider {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self {
            zones: RwLock::new(zones.into_iter().map(|z| (z.name.clone(), z)).collect()),
            patches: RwLock::new(Vec::new()),
            created: RwLock::new(Vec::new()),
            deleted: RwLock::new(Vec::new()),
            failing_names: RwLock::new(HashSet::new()),
        }
    }

    /// `example.net.` with an SOA and the given RRsets.
    pub fn with_parent_zone(rrsets: Vec<Rrset>) -> Self {
        let mut all = vec![rrset(
            PARENT_ZONE,
            RecordType::Soa,
            &["ns1.example.net. hostmaster.example.net. 1 10800 3600 604800 3600"],
        )];
        all.extend(rrsets);
        Self::new(vec![Zone {
            name: PARENT_ZONE.to_string(),
            kind: None,
            serial: Some(1),
            rrsets: all,
        }])
    }

    pub async fn fail_patches_for(&self, name: &str) {
        self.failing_names.write().await.insert(name.to_string());
    }

    pub async fn clear_failures(&self) {
        self.failing_names.write().await.clear();
    }

    pub async fn patches(&self) -> Vec<(String, Vec<RrsetChange>)> {
        self.patches.read().await.clone()
    }

    pub async fn created_zones(&self) -> Vec<(String, Vec<String>)> {
        self.created.read().await.clone()
    }

    pub async fn deleted_zones(&self) -> Vec<String> {
        self.deleted.read().await.clone()
    }

    pub async fn zone(&self, name: &str) -> Option<Zone> {
        self.zones.read().await.get(name).cloned()
    }

    pub async fn rrset(&self, zone: &str, name: &str, record_type: RecordType) -> Option<Rrset> {
        self.zone(zone).await.and_then(|z| {
            z.rrsets
                .into_iter()
                .find(|r| r.name == name && r.record_type == record_type)
        })
    }

    fn not_found(zone: &str) -> ProviderError {
        ProviderError::ZoneNotFound {
            provider: "mock".to_string(),
            zone: zone.to_string(),
            raw_message: None,
        }
    }
}

#[async_trait]
impl ZoneProvider for MockZoneProvider {
    fn id(&self) -> &'static str {
        "mock"
    }

    async fn create_zone(&self, zone: &str, nameservers: &[String]) -> domain_warden_provider::Result<()> {
        let mut zones = self.zones.write().await;
        if zones.contains_key(zone) {
            return Err(ProviderError::ZoneExists {
                provider: "mock".to_string(),
                zone: zone.to_string(),
                raw_message: None,
            });
        }
        zones.insert(
            zone.to_string(),
            Zone {
                name: zone.to_string(),
                kind: None,
                serial: Some(1),
                rrsets: Vec::new(),
            },
        );
        self.created
            .write()
            .await
            .push((zone.to_string(), nameservers.to_vec()));
        Ok(())
    }

    async fn delete_zone(&self, zone: &str) -> domain_warden_provider::Result<()> {
        if self.zones.write().await.remove(zone).is_none() {
            return Err(Self::not_found(zone));
        }
        self.deleted.write().await.push(zone.to_string());
        Ok(())
    }

    async fn get_zone(&self, zone: &str) -> domain_warden_provider::Result<Zone> {
        self.zone(zone).await.ok_or_else(|| Self::not_found(zone))
    }

    async fn patch_rrsets(&self, zone: &str, changes: &[RrsetChange]) -> domain_warden_provider::Result<()> {
        {
            let failing = self.failing_names.read().await;
            if let Some(change) = changes.iter().find(|c| failing.contains(&c.name)) {
                return Err(ProviderError::NetworkError {
                    provider: "mock".to_string(),
                    detail: format!("injected failure for {}", change.name),
                });
            }
        }

        self.patches
            .write()
            .await
            .push((zone.to_string(), changes.to_vec()));

        let mut zones = self.zones.write().await;
        let Some(target) = zones.get_mut(zone) else {
            return Err(Self::not_found(zone));
        };
        for change in changes {
            target
                .rrsets
                .retain(|r| !(r.name == change.name && r.record_type == change.record_type));
            if change.changetype == ChangeType::Replace {
                target.rrsets.push(Rrset {
                    name: change.name.clone(),
                    record_type: change.record_type,
                    ttl: change.ttl.unwrap_or_default(),
                    records: change.records.clone(),
                });
            }
        }
        Ok(())
    }
}

// ===== MockProber =====

/// Every FQDN is healthy unless marked down.
pub struct MockProber {
    down: RwLock<HashSet<String>>,
    calls: RwLock<Vec<(CheckType, String)>>,
}

impl MockProber {
    pub fn new() -> Self {
        Self {
            down: RwLock::new(HashSet::new()),
            calls: RwLock::new(Vec::new()),
        }
    }

    pub async fn set_down(&self, fqdn: &str, down: bool) {
        let mut set = self.down.write().await;
        if down {
            set.insert(fqdn.to_string());
        } else {
            set.remove(fqdn);
        }
    }

    pub async fn calls(&self) -> Vec<(CheckType, String)> {
        self.calls.read().await.clone()
    }

    async fn run(&self, check_type: CheckType, fqdn: &str) -> CheckOutcome {
        self.calls
            .write()
            .await
            .push((check_type, fqdn.to_string()));
        if self.down.read().await.contains(fqdn) {
            return CheckOutcome::failed(check_type, "unreachable").with_latency(5);
        }
        let details = match check_type {
            CheckType::Dns => ScanDetails::Dns {
                addresses: vec!["192.0.2.10".to_string()],
            },
            CheckType::Http => ScanDetails::Http { status_code: 200 },
            _ => ScanDetails::Tls {
                not_before: t0() - Duration::days(30),
                not_after: t0() + Duration::days(365),
                valid: true,
            },
        };
        CheckOutcome::success(check_type)
            .with_latency(5)
            .with_details(details)
    }
}

#[async_trait]
impl Prober for MockProber {
    async fn check_dns(&self, fqdn: &str) -> CheckOutcome {
        self.run(CheckType::Dns, fqdn).await
    }

    async fn check_http(&self, fqdn: &str) -> CheckOutcome {
        self.run(CheckType::Http, fqdn).await
    }

    async fn check_tls(&self, fqdn: &str) -> CheckOutcome {
        self.run(CheckType::Ssl, fqdn).await
    }
}

// ===== MockThreatSource =====

pub struct MockThreatSource {
    service: ThreatService,
    status: RwLock<CheckStatus>,
    calls: AtomicUsize,
}

impl MockThreatSource {
    pub fn new(service: ThreatService, status: CheckStatus) -> Self {
        Self {
            service,
            status: RwLock::new(status),
            calls: AtomicUsize::new(0),
        }
    }

    pub async fn set_status(&self, status: CheckStatus) {
        *self.status.write().await = status;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThreatSource for MockThreatSource {
    fn service(&self) -> ThreatService {
        self.service
    }

    async fn lookup(&self, fqdn: &str) -> CheckOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let status = *self.status.read().await;
        let outcome = CheckOutcome::new(self.service.check_type(), status);
        match (self.service, status) {
            (ThreatService::SafeBrowsing, CheckStatus::ThreatDetected) => {
                outcome.with_details(ScanDetails::SafeBrowsing {
                    matches: vec![ThreatMatch {
                        threat_type: "MALWARE".to_string(),
                        platform_type: "ANY_PLATFORM".to_string(),
                        url: format!("http://{fqdn}/"),
                    }],
                })
            }
            (ThreatService::VirusTotal, CheckStatus::ThreatDetected | CheckStatus::Success) => {
                let malicious = u32::from(status == CheckStatus::ThreatDetected) * 3;
                outcome.with_details(ScanDetails::VirusTotal {
                    stats: AnalysisStats {
                        malicious,
                        harmless: 70,
                        ..AnalysisStats::default()
                    },
                })
            }
            _ => outcome,
        }
    }
}

// ===== RecordingNotifier =====

pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.notifications().iter().map(|n| n.kind).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

// ===== Harness =====

/// A [`ServiceContext`] wired to mocks, with handles to each of them.
pub struct TestHarness {
    pub store: Arc<MockStore>,
    pub zones: Arc<MockZoneProvider>,
    pub prober: Arc<MockProber>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<FixedClock>,
    pub ctx: Arc<ServiceContext>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_zones(MockZoneProvider::with_parent_zone(Vec::new()))
    }

    pub fn with_zones(zones: MockZoneProvider) -> Self {
        let store = Arc::new(MockStore::new());
        let zones = Arc::new(zones);
        let prober = Arc::new(MockProber::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(FixedClock::new(t0()));
        let ctx = Arc::new(ServiceContext {
            domain_repository: store.clone(),
            pending_domain_repository: store.clone(),
            dns_record_repository: store.clone(),
            scan_repository: store.clone(),
            quota_repository: store.clone(),
            zone_provider: zones.clone(),
            prober: prober.clone(),
            notifier: notifier.clone(),
            clock: clock.clone(),
        });
        Self {
            store,
            zones,
            prober,
            notifier,
            clock,
            ctx,
        }
    }
}
