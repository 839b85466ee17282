//! Application bootstrap for Domain Warden.
//!
//! Provides `AppState` (service container) and `AppStateBuilder` (adapter
//! injection). The daemon builds one `AppState` at startup and drives the
//! periodic scanner from it; the CRUD layer uses the same state for record
//! reconciliation and health reports.

pub mod adapters;

use std::sync::Arc;

use tokio::sync::watch;

use domain_warden_core::error::{CoreError, CoreResult};
use domain_warden_core::services::{
    DnsReconciler, LifecycleService, NetworkProber, ScanService, ServiceContext,
    ThreatIntelGateway,
};
use domain_warden_core::traits::{
    Clock, DnsRecordRepository, DomainRepository, NoopNotifier, Notifier,
    PendingDomainRepository, Prober, QuotaRepository, ScanRepository, SystemClock,
};
use domain_warden_core::types::{
    LifecyclePolicy, ScannerConfig, ThreatIntelConfig, ThreatService,
};
use domain_warden_provider::ZoneProvider;

/// Application state.
///
/// Holds every service and the `ServiceContext`. Built once at startup via
/// `AppStateBuilder`.
pub struct AppState {
    /// Service context (holds all adapters)
    pub ctx: Arc<ServiceContext>,
    /// DNS reconciler shared by the CRUD layer and the lifecycle
    pub reconciler: Arc<DnsReconciler>,
    /// Quota-gated reputation services
    pub gateway: Arc<ThreatIntelGateway>,
    /// Scan service and periodic driver
    pub scan_service: Arc<ScanService>,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    /// Startup sequence: reload today's quota counters.
    pub async fn run_startup(&self) {
        self.gateway.restore_quotas().await;
        log::info!(
            "Startup complete: Safe Browsing {}, VirusTotal {}",
            enabled(self.gateway.is_configured(ThreatService::SafeBrowsing)),
            enabled(self.gateway.is_configured(ThreatService::VirusTotal)),
        );
    }

    /// Ask the periodic driver to stop; an in-flight batch pause ends immediately.
    pub fn shutdown(&self) {
        log::info!("Shutdown requested");
        self.shutdown.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}

fn enabled(on: bool) -> &'static str {
    if on { "enabled" } else { "disabled" }
}

/// Builder for `AppState`.
///
/// # Required adapters
/// - the five repositories (or `sqlite_store` for all of them)
/// - `zone_provider`: the authoritative DNS server API
///
/// # Optional
/// - `prober`: defaults to `NetworkProber` with the scanner's check timeout
/// - `notifier`: defaults to `NoopNotifier`
/// - `clock`: defaults to `SystemClock`
/// - `threat_gateway`: defaults to one built from `threat_intel_config`
pub struct AppStateBuilder {
    domain_repository: Option<Arc<dyn DomainRepository>>,
    pending_domain_repository: Option<Arc<dyn PendingDomainRepository>>,
    dns_record_repository: Option<Arc<dyn DnsRecordRepository>>,
    scan_repository: Option<Arc<dyn ScanRepository>>,
    quota_repository: Option<Arc<dyn QuotaRepository>>,
    zone_provider: Option<Arc<dyn ZoneProvider>>,
    prober: Option<Arc<dyn Prober>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
    threat_gateway: Option<ThreatIntelGateway>,
    scanner_config: ScannerConfig,
    lifecycle_policy: LifecyclePolicy,
    threat_intel_config: ThreatIntelConfig,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            domain_repository: None,
            pending_domain_repository: None,
            dns_record_repository: None,
            scan_repository: None,
            quota_repository: None,
            zone_provider: None,
            prober: None,
            notifier: None,
            clock: None,
            threat_gateway: None,
            scanner_config: ScannerConfig::default(),
            lifecycle_policy: LifecyclePolicy::default(),
            threat_intel_config: ThreatIntelConfig::default(),
        }
    }

    /// Use one `SqliteStore` for every repository.
    #[cfg(feature = "sqlite-store")]
    #[must_use]
    pub fn sqlite_store(self, store: Arc<adapters::SqliteStore>) -> Self {
        self.domain_repository(store.clone())
            .pending_domain_repository(store.clone())
            .dns_record_repository(store.clone())
            .scan_repository(store.clone())
            .quota_repository(store)
    }

    #[must_use]
    pub fn domain_repository(mut self, repo: Arc<dyn DomainRepository>) -> Self {
        self.domain_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn pending_domain_repository(mut self, repo: Arc<dyn PendingDomainRepository>) -> Self {
        self.pending_domain_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn dns_record_repository(mut self, repo: Arc<dyn DnsRecordRepository>) -> Self {
        self.dns_record_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn scan_repository(mut self, repo: Arc<dyn ScanRepository>) -> Self {
        self.scan_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn quota_repository(mut self, repo: Arc<dyn QuotaRepository>) -> Self {
        self.quota_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn zone_provider(mut self, provider: Arc<dyn ZoneProvider>) -> Self {
        self.zone_provider = Some(provider);
        self
    }

    #[must_use]
    pub fn prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = Some(prober);
        self
    }

    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn threat_gateway(mut self, gateway: ThreatIntelGateway) -> Self {
        self.threat_gateway = Some(gateway);
        self
    }

    #[must_use]
    pub fn scanner_config(mut self, config: ScannerConfig) -> Self {
        self.scanner_config = config;
        self
    }

    #[must_use]
    pub fn lifecycle_policy(mut self, policy: LifecyclePolicy) -> Self {
        self.lifecycle_policy = policy;
        self
    }

    #[must_use]
    pub fn threat_intel_config(mut self, config: ThreatIntelConfig) -> Self {
        self.threat_intel_config = config;
        self
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `CoreError::ValidationError` if required adapters are missing.
    pub fn build(self) -> CoreResult<AppState> {
        let domain_repository = required(self.domain_repository, "domain_repository")?;
        let pending_domain_repository =
            required(self.pending_domain_repository, "pending_domain_repository")?;
        let dns_record_repository = required(self.dns_record_repository, "dns_record_repository")?;
        let scan_repository = required(self.scan_repository, "scan_repository")?;
        let quota_repository = required(self.quota_repository, "quota_repository")?;
        let zone_provider = required(self.zone_provider, "zone_provider")?;

        let check_timeout = self.scanner_config.check_timeout();
        let prober = self
            .prober
            .unwrap_or_else(|| Arc::new(NetworkProber::with_timeout(check_timeout)));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(NoopNotifier));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let gateway = Arc::new(self.threat_gateway.unwrap_or_else(|| {
            ThreatIntelGateway::from_config(&self.threat_intel_config, &quota_repository, &clock)
        }));

        let ctx = Arc::new(ServiceContext {
            domain_repository,
            pending_domain_repository,
            dns_record_repository,
            scan_repository,
            quota_repository,
            zone_provider,
            prober,
            notifier,
            clock,
        });

        let reconciler = Arc::new(DnsReconciler::new(
            Arc::clone(&ctx),
            self.scanner_config.max_concurrent_reconciles,
        ));
        let lifecycle = LifecycleService::new(
            Arc::clone(&ctx),
            Arc::clone(&reconciler),
            self.lifecycle_policy,
        );

        let (shutdown, shutdown_rx) = watch::channel(false);
        let scan_service = Arc::new(ScanService::new(
            Arc::clone(&ctx),
            Arc::clone(&gateway),
            lifecycle,
            self.scanner_config,
            shutdown_rx,
        ));

        Ok(AppState {
            ctx,
            reconciler,
            gateway,
            scan_service,
            shutdown,
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn required<T>(value: Option<T>, name: &str) -> CoreResult<T> {
    value.ok_or_else(|| CoreError::ValidationError(format!("{name} is required")))
}
