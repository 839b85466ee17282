//! Scan orchestration: per-domain checks, batched cycles and the periodic driver.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use super::health_aggregator::HealthAggregator;
use super::lifecycle::LifecycleService;
use super::log_core_error;
use super::threat_intel::ThreatIntelGateway;
use crate::ServiceContext;
use crate::error::{CoreError, CoreResult};
use crate::types::{
    CheckOutcome, Domain, DomainId, HealthReport, HealthSummary, PendingDomain, QuotaStatus,
    ScanResult, ScannerConfig, ThreatService,
};

/// Totals of one pass over the domain list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCycleReport {
    pub scanned: usize,
    pub failed: usize,
    /// The shutdown signal stopped the pass early.
    pub interrupted: bool,
}

/// Scan service.
pub struct ScanService {
    ctx: Arc<ServiceContext>,
    gateway: Arc<ThreatIntelGateway>,
    lifecycle: LifecycleService,
    config: ScannerConfig,
    shutdown: watch::Receiver<bool>,
}

impl ScanService {
    /// `shutdown` flips to `true` to stop the periodic driver.
    pub fn new(
        ctx: Arc<ServiceContext>,
        gateway: Arc<ThreatIntelGateway>,
        lifecycle: LifecycleService,
        config: ScannerConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            ctx,
            gateway,
            lifecycle,
            config,
            shutdown,
        }
    }

    fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Scan one registered domain now.
    pub async fn scan_domain(&self, domain_id: DomainId) -> CoreResult<HealthSummary> {
        let domain = self
            .ctx
            .domain_repository
            .find_by_id(domain_id)
            .await?
            .filter(|d| !d.is_deleted())
            .ok_or_else(|| CoreError::DomainNotFound(domain_id.to_string()))?;
        self.scan_loaded_domain(domain).await
    }

    /// Run every check for `domain`, store the rows and summary, then apply the
    /// lifecycle. Storage failures after the checks are logged, not returned.
    async fn scan_loaded_domain(&self, domain: Domain) -> CoreResult<HealthSummary> {
        let fqdn = domain.full_domain.clone();
        log::debug!("[scan] {fqdn}: starting checks");

        let prober = &self.ctx.prober;
        let mut outcomes: Vec<CheckOutcome> = vec![
            prober.check_dns(&fqdn).await,
            prober.check_http(&fqdn).await,
            prober.check_tls(&fqdn).await,
        ];
        for service in ThreatService::ALL {
            if let Some(outcome) = self.gateway.check(service, &fqdn).await {
                outcomes.push(outcome);
            }
        }

        let now = self.ctx.clock.now();
        let rows: Vec<ScanResult> = outcomes
            .iter()
            .map(|o| ScanResult::from_outcome(domain.id, o, now))
            .collect();
        let scans = &self.ctx.scan_repository;
        if let Err(e) = scans.insert_results(&rows).await {
            log_core_error(&format!("[scan] {fqdn}: failed to store results"), &e);
        }

        let previous = scans.find_summary(domain.id).await.unwrap_or_else(|e| {
            log_core_error(&format!("[scan] {fqdn}: failed to load summary"), &e);
            None
        });
        let summary = HealthAggregator::summarize(domain.id, previous.as_ref(), &outcomes, now);
        if let Err(e) = scans.save_summary(&summary).await {
            log_core_error(&format!("[scan] {fqdn}: failed to store summary"), &e);
        }
        log::info!(
            "[scan] {fqdn}: {:?} (dns={:?}, http={:?}, ssl={:?})",
            summary.overall_health,
            summary.dns,
            summary.http,
            summary.ssl
        );

        if let Err(e) = self
            .lifecycle
            .evaluate_domain(domain, summary.is_down(), summary.issues(), &outcomes)
            .await
        {
            log_core_error(&format!("[lifecycle] {fqdn}: transition failed"), &e);
        }
        Ok(summary)
    }

    /// DNS and HTTP only; nothing is written to the scan tables.
    async fn scan_pending_domain(&self, pending: PendingDomain) -> CoreResult<()> {
        let fqdn = pending.full_domain.clone();
        let dns = self.ctx.prober.check_dns(&fqdn).await;
        let http = self.ctx.prober.check_http(&fqdn).await;

        let mut issues = Vec::new();
        if !dns.is_success() {
            issues.push("DNS resolution failed".to_string());
        }
        if !http.is_success() {
            issues.push("HTTP unreachable".to_string());
        }
        let is_down = !issues.is_empty();
        log::debug!("[scan] pending {fqdn}: down={is_down}");

        self.lifecycle
            .evaluate_pending(pending, is_down, issues)
            .await
            .map(|_| ())
    }

    /// Scan every non-tombstoned domain in batches.
    ///
    /// Domains inside a batch are scanned one at a time. Shutdown is honoured
    /// between batches and during the pause.
    pub async fn scan_all_active_domains(&self) -> ScanCycleReport {
        let mut report = ScanCycleReport::default();
        let mut after: Option<DomainId> = None;
        let batch_size = self.config.batch_size.max(1);

        loop {
            if self.is_shutting_down() {
                report.interrupted = true;
                break;
            }
            let batch = match self
                .ctx
                .domain_repository
                .list_live_after(after, batch_size)
                .await
            {
                Ok(batch) => batch,
                Err(e) => {
                    log_core_error("[scan] Failed to list domains", &e);
                    break;
                }
            };
            let Some(last) = batch.last() else { break };
            after = Some(last.id);
            let full_batch = batch.len() >= batch_size;

            for domain in batch {
                match self.scan_loaded_domain(domain).await {
                    Ok(_) => report.scanned += 1,
                    Err(e) => {
                        report.failed += 1;
                        log_core_error("[scan] Domain scan failed", &e);
                    }
                }
            }

            if !full_batch || !self.pause_between_batches().await {
                report.interrupted |= self.is_shutting_down();
                break;
            }
        }

        log::info!(
            "[scan] Cycle finished: {} scanned, {} failed{}",
            report.scanned,
            report.failed,
            if report.interrupted { " (interrupted)" } else { "" }
        );
        report
    }

    /// Scan every pending reservation in batches.
    pub async fn scan_all_pending_domains(&self) -> ScanCycleReport {
        let mut report = ScanCycleReport::default();
        let mut after = None;
        let batch_size = self.config.batch_size.max(1);

        loop {
            if self.is_shutting_down() {
                report.interrupted = true;
                break;
            }
            let batch = match self
                .ctx
                .pending_domain_repository
                .list_after(after, batch_size)
                .await
            {
                Ok(batch) => batch,
                Err(e) => {
                    log_core_error("[scan] Failed to list pending domains", &e);
                    break;
                }
            };
            let Some(last) = batch.last() else { break };
            after = Some(last.id);
            let full_batch = batch.len() >= batch_size;

            for pending in batch {
                match self.scan_pending_domain(pending).await {
                    Ok(()) => report.scanned += 1,
                    Err(e) => {
                        report.failed += 1;
                        log_core_error("[scan] Pending domain scan failed", &e);
                    }
                }
            }

            if !full_batch || !self.pause_between_batches().await {
                report.interrupted |= self.is_shutting_down();
                break;
            }
        }

        log::info!(
            "[scan] Pending cycle finished: {} scanned, {} failed",
            report.scanned,
            report.failed
        );
        report
    }

    /// Sleep for the batch pause; `false` if shutdown arrived meanwhile.
    async fn pause_between_batches(&self) -> bool {
        let mut shutdown = self.shutdown.clone();
        tokio::select! {
            () = tokio::time::sleep(self.config.batch_pause()) => !self.is_shutting_down(),
            _ = shutdown.wait_for(|stop| *stop) => false,
        }
    }

    /// Scan now, then once per interval, until shutdown.
    pub async fn run_periodic(&self) {
        let mut shutdown = self.shutdown.clone();
        let mut ticker = tokio::time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        log::info!(
            "[scan] Periodic driver started (interval {}s)",
            self.config.interval().as_secs()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.wait_for(|stop| *stop) => break,
            }
            if self.is_shutting_down() {
                break;
            }
            self.scan_all_active_domains().await;
            if self.is_shutting_down() {
                break;
            }
            self.scan_all_pending_domains().await;
        }
        log::info!("[scan] Periodic driver stopped");
    }

    /// Today's threat-intel quota usage.
    pub async fn get_quota_status(&self) -> Vec<QuotaStatus> {
        self.gateway.quota_status().await
    }

    /// Latest summary with uptime, `None` before the first scan.
    pub async fn get_health_report(&self, domain_id: DomainId) -> CoreResult<Option<HealthReport>> {
        let summary = self.ctx.scan_repository.find_summary(domain_id).await?;
        Ok(summary.map(HealthReport::from_summary))
    }

    /// Most recent check rows of a domain, newest first.
    pub async fn recent_results(&self, domain_id: DomainId, limit: usize) -> CoreResult<Vec<ScanResult>> {
        self.ctx.scan_repository.recent_results(domain_id, limit).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::time::Instant;

    use crate::services::{DnsReconciler, QuotaTracker};
    use crate::test_utils::{MockThreatSource, TestHarness, domain};
    use crate::traits::{Clock, QuotaRepository, ThreatSource};
    use crate::types::{
        CheckStatus, CheckType, DomainStatus, LifecyclePolicy, OverallHealth, PendingDomain,
        SuspendReason, VirusTotalVerdict,
    };

    fn scanner(
        h: &TestHarness,
        gateway: ThreatIntelGateway,
        config: ScannerConfig,
    ) -> (ScanService, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        let reconciler = Arc::new(DnsReconciler::new(Arc::clone(&h.ctx), 4));
        let lifecycle =
            LifecycleService::new(Arc::clone(&h.ctx), reconciler, LifecyclePolicy::default());
        let service = ScanService::new(Arc::clone(&h.ctx), Arc::new(gateway), lifecycle, config, rx);
        (service, tx)
    }

    fn batches(size: usize, pause_secs: u64) -> ScannerConfig {
        ScannerConfig {
            batch_size: size,
            batch_pause_secs: pause_secs,
            ..ScannerConfig::default()
        }
    }

    fn virus_total(h: &TestHarness, status: CheckStatus, limit: u32) -> (ThreatIntelGateway, Arc<MockThreatSource>) {
        let source = Arc::new(MockThreatSource::new(ThreatService::VirusTotal, status));
        let quota = QuotaTracker::new(
            ThreatService::VirusTotal,
            limit,
            Duration::ZERO,
            Arc::clone(&h.store) as Arc<dyn QuotaRepository>,
            Arc::clone(&h.clock) as Arc<dyn Clock>,
        );
        let gateway = ThreatIntelGateway::new()
            .with_source(Arc::clone(&source) as Arc<dyn ThreatSource>, quota);
        (gateway, source)
    }

    async fn seed_domains(h: &TestHarness, count: i64) {
        for id in 1..=count {
            h.store.insert_domain(domain(id, &format!("site{id}"))).await;
        }
    }

    #[tokio::test]
    async fn scan_stores_rows_and_summary() {
        let h = TestHarness::new();
        seed_domains(&h, 1).await;
        let (scanner, _tx) = scanner(&h, ThreatIntelGateway::new(), ScannerConfig::default());

        let summary = scanner.scan_domain(1).await.unwrap();
        assert_eq!(summary.overall_health, OverallHealth::Healthy);
        assert_eq!(summary.virus_total, VirusTotalVerdict::Unknown);
        assert_eq!(summary.http_status_code, Some(200));

        let rows = h.store.results_of(1).await;
        let kinds: Vec<CheckType> = rows.iter().map(|r| r.check_type).collect();
        assert_eq!(kinds, [CheckType::Dns, CheckType::Http, CheckType::Ssl]);

        scanner.scan_domain(1).await.unwrap();
        let report = scanner.get_health_report(1).await.unwrap().unwrap();
        assert_eq!(report.summary.total_scans, 2);
        assert!((report.uptime_percentage - 100.0).abs() < f64::EPSILON);

        let recent = scanner.recent_results(1, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].id > recent[1].id);
        assert!(scanner.get_health_report(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_or_deleted_domain_is_not_found() {
        let h = TestHarness::new();
        let mut gone = domain(2, "gone");
        gone.deleted_at = Some(h.clock.now());
        h.store.insert_domain(gone).await;
        let (scanner, _tx) = scanner(&h, ThreatIntelGateway::new(), ScannerConfig::default());

        for id in [1, 2] {
            let err = scanner.scan_domain(id).await.unwrap_err();
            assert!(matches!(err, CoreError::DomainNotFound(_)), "{err:?}");
        }
    }

    #[tokio::test]
    async fn outage_feeds_the_lifecycle() {
        let h = TestHarness::new();
        seed_domains(&h, 1).await;
        h.prober.set_down("site1.example.net", true).await;
        let (scanner, _tx) = scanner(&h, ThreatIntelGateway::new(), ScannerConfig::default());

        let summary = scanner.scan_domain(1).await.unwrap();
        assert_eq!(summary.overall_health, OverallHealth::Down);
        assert_eq!(summary.successful_scans, 0);
        assert!(h.store.domain(1).await.unwrap().first_failed_at.is_some());
        assert_eq!(h.notifier.notifications()[0].issues, summary.issues());
    }

    #[tokio::test(start_paused = true)]
    async fn batches_are_separated_by_a_pause() {
        let h = TestHarness::new();
        seed_domains(&h, 5).await;
        let (scanner, _tx) = scanner(&h, ThreatIntelGateway::new(), batches(2, 60));

        let start = Instant::now();
        let report = scanner.scan_all_active_domains().await;
        let elapsed = start.elapsed();

        assert_eq!(report.scanned, 5);
        assert!(!report.interrupted);
        // Three batches, two pauses.
        assert!(elapsed >= Duration::from_secs(120), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(180), "{elapsed:?}");
    }

    #[tokio::test]
    async fn tombstoned_domains_are_skipped() {
        let h = TestHarness::new();
        seed_domains(&h, 3).await;
        let mut gone = h.store.domain(2).await.unwrap();
        gone.deleted_at = Some(h.clock.now());
        h.store.insert_domain(gone).await;
        let (scanner, _tx) = scanner(&h, ThreatIntelGateway::new(), batches(1, 0));

        let report = scanner.scan_all_active_domains().await;
        assert_eq!(report.scanned, 2);
        assert!(h.store.results_of(2).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_the_pause() {
        let h = TestHarness::new();
        seed_domains(&h, 4).await;
        let (scanner, tx) = scanner(&h, ThreatIntelGateway::new(), batches(2, 3600));

        let start = Instant::now();
        let (report, ()) = tokio::join!(scanner.scan_all_active_domains(), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            tx.send(true).unwrap();
        });

        assert_eq!(report.scanned, 2);
        assert!(report.interrupted);
        assert!(start.elapsed() < Duration::from_secs(3600));
        assert!(h.store.results_of(3).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_driver_runs_until_shutdown() {
        let h = TestHarness::new();
        seed_domains(&h, 1).await;
        let (scanner, tx) = scanner(
            &h,
            ThreatIntelGateway::new(),
            ScannerConfig {
                interval_secs: 3600,
                ..ScannerConfig::default()
            },
        );

        tokio::join!(scanner.run_periodic(), async {
            tokio::time::sleep(Duration::from_secs(5400)).await;
            tx.send(true).unwrap();
        });

        // Immediate cycle plus the one an hour later.
        assert_eq!(h.store.results_of(1).await.len(), 6);
    }

    #[tokio::test]
    async fn pending_pass_only_probes_reachability() {
        let h = TestHarness::new();
        h.store
            .insert_pending(PendingDomain::new(7, "new.example.net", h.clock.now()))
            .await;
        h.prober.set_down("new.example.net", true).await;
        let (scanner, _tx) = scanner(&h, ThreatIntelGateway::new(), ScannerConfig::default());

        let report = scanner.scan_all_pending_domains().await;
        assert_eq!(report.scanned, 1);

        let checks: Vec<CheckType> = h.prober.calls().await.into_iter().map(|(c, _)| c).collect();
        assert_eq!(checks, [CheckType::Dns, CheckType::Http]);
        assert!(h.store.results_of(7).await.is_empty());
        assert!(h.store.summary(7).await.is_none());
        assert!(h.store.pending(7).await.unwrap().first_failed_at.is_some());
    }

    #[tokio::test]
    async fn confirmed_threat_suspends() {
        let h = TestHarness::new();
        seed_domains(&h, 1).await;
        let (gateway, _source) = virus_total(&h, CheckStatus::ThreatDetected, 500);
        let (scanner, _tx) = scanner(&h, gateway, ScannerConfig::default());

        let summary = scanner.scan_domain(1).await.unwrap();
        assert_eq!(summary.virus_total, VirusTotalVerdict::Malicious);
        assert_eq!(summary.overall_health, OverallHealth::Degraded);

        let stored = h.store.domain(1).await.unwrap();
        assert_eq!(stored.status, DomainStatus::Suspended);
        assert_eq!(stored.suspend_reason, Some(SuspendReason::Threat));
    }

    #[tokio::test]
    async fn exhausted_quota_never_suspends() {
        let h = TestHarness::new();
        seed_domains(&h, 3).await;
        let (gateway, source) = virus_total(&h, CheckStatus::Success, 2);
        let (scanner, _tx) = scanner(&h, gateway, ScannerConfig::default());

        let report = scanner.scan_all_active_domains().await;
        assert_eq!(report.scanned, 3);
        assert_eq!(source.calls(), 2);

        let vt_row = h
            .store
            .results_of(3)
            .await
            .into_iter()
            .find(|r| r.check_type == CheckType::VirusTotal)
            .unwrap();
        assert_eq!(vt_row.status, CheckStatus::QuotaExceeded);
        assert!(vt_row.error_message.is_some());

        let summary = h.store.summary(3).await.unwrap();
        assert_eq!(summary.virus_total, VirusTotalVerdict::Unknown);
        assert!(!h.store.domain(3).await.unwrap().is_suspended());
        assert!(h.store.suspensions().await.is_empty());

        let quota = scanner.get_quota_status().await;
        assert_eq!((quota[0].used, quota[0].remaining()), (2, 0));
    }
}
