#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for `AppStateBuilder` and the services it wires together,
//! backed by a real `SqliteStore` and a PowerDNS API served by wiremock.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use domain_warden_app::AppStateBuilder;
use domain_warden_app::adapters::SqliteStore;
use domain_warden_core::error::CoreError;
use domain_warden_core::traits::{DnsRecordRepository, DomainRepository, Prober};
use domain_warden_core::types::{
    CheckOutcome, CheckType, DnsHealth, DnsRecord, Domain, HttpHealth, OverallHealth, RecordType,
    ScanDetails, ThreatService,
};
use domain_warden_provider::{PowerDnsConfig, PowerDnsProvider};

const ZONE_PATH: &str = "/api/v1/servers/localhost/zones/example.net.";

// ===== Helpers =====

async fn create_test_sqlite_store() -> (Arc<SqliteStore>, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let db_path = tmp.path().join("warden.db");
    let store = SqliteStore::new(&db_path)
        .await
        .expect("failed to create SqliteStore");
    (Arc::new(store), tmp)
}

fn powerdns(server: &MockServer) -> Arc<PowerDnsProvider> {
    Arc::new(PowerDnsProvider::new(PowerDnsConfig {
        api_url: server.uri(),
        api_key: "test-key".to_string(),
        max_retries: 0,
        timeout_secs: 5,
        ..PowerDnsConfig::default()
    }))
}

/// Prober with a switchable DNS outcome; HTTP and TLS mirror it.
struct StaticProber {
    down: RwLock<bool>,
}

impl StaticProber {
    fn healthy() -> Self {
        Self {
            down: RwLock::new(false),
        }
    }

    fn down() -> Self {
        Self {
            down: RwLock::new(true),
        }
    }

    async fn outcome(&self, check_type: CheckType, details: ScanDetails) -> CheckOutcome {
        if *self.down.read().await {
            CheckOutcome::failed(check_type, "connection refused")
        } else {
            CheckOutcome::success(check_type).with_details(details)
        }
    }
}

#[async_trait]
impl Prober for StaticProber {
    async fn check_dns(&self, _fqdn: &str) -> CheckOutcome {
        self.outcome(
            CheckType::Dns,
            ScanDetails::Dns {
                addresses: vec!["192.0.2.1".to_string()],
            },
        )
        .await
    }

    async fn check_http(&self, _fqdn: &str) -> CheckOutcome {
        self.outcome(CheckType::Http, ScanDetails::Http { status_code: 200 })
            .await
    }

    async fn check_tls(&self, _fqdn: &str) -> CheckOutcome {
        let now = Utc::now();
        self.outcome(
            CheckType::Ssl,
            ScanDetails::Tls {
                not_before: now - chrono::Duration::days(1),
                not_after: now + chrono::Duration::days(89),
                valid: true,
            },
        )
        .await
    }
}

fn make_domain(id: i64, label: &str) -> Domain {
    Domain::new(id, format!("{label}.example.net"), "example.net", Utc::now())
}

fn make_record(domain_id: i64, name: &str, content: &str) -> DnsRecord {
    DnsRecord {
        id: 0,
        domain_id,
        name: name.to_string(),
        record_type: RecordType::A,
        content: content.to_string(),
        ttl: 3600,
        priority: None,
        active: true,
        synced: false,
        last_sync_error: None,
        last_synced_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// ===== Builder validation =====

#[tokio::test]
async fn build_requires_repositories() {
    let server = MockServer::start().await;
    let result = AppStateBuilder::new().zone_provider(powerdns(&server)).build();
    match result {
        Err(CoreError::ValidationError(msg)) => assert_eq!(msg, "domain_repository is required"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("builder accepted missing repositories"),
    }
}

#[tokio::test]
async fn build_requires_zone_provider() {
    let (store, _tmp) = create_test_sqlite_store().await;
    let result = AppStateBuilder::new().sqlite_store(store).build();
    assert!(
        matches!(&result, Err(CoreError::ValidationError(msg)) if msg == "zone_provider is required"),
        "unexpected build result"
    );
}

#[tokio::test]
async fn default_build_has_no_threat_services() {
    let server = MockServer::start().await;
    let (store, _tmp) = create_test_sqlite_store().await;
    let state = AppStateBuilder::new()
        .sqlite_store(store)
        .zone_provider(powerdns(&server))
        .build()
        .unwrap();

    state.run_startup().await;
    assert!(!state.gateway.is_configured(ThreatService::SafeBrowsing));
    assert!(!state.gateway.is_configured(ThreatService::VirusTotal));
    assert!(state.scan_service.get_quota_status().await.is_empty());
}

// ===== Wired services =====

#[tokio::test]
async fn scan_writes_summary_to_sqlite() {
    let server = MockServer::start().await;
    let (store, _tmp) = create_test_sqlite_store().await;
    DomainRepository::update(store.as_ref(), &make_domain(1, "shop"))
        .await
        .unwrap();

    let state = AppStateBuilder::new()
        .sqlite_store(Arc::clone(&store))
        .zone_provider(powerdns(&server))
        .prober(Arc::new(StaticProber::healthy()))
        .build()
        .unwrap();

    let summary = state.scan_service.scan_domain(1).await.unwrap();
    assert_eq!(summary.overall_health, OverallHealth::Healthy);

    let report = state
        .scan_service
        .get_health_report(1)
        .await
        .unwrap()
        .expect("summary stored");
    assert_eq!(report.summary.dns, DnsHealth::Resolved);
    assert_eq!(report.summary.http, HttpHealth::Online);
    assert_eq!(report.summary.http_status_code, Some(200));
    assert!((report.uptime_percentage - 100.0).abs() < f64::EPSILON);

    let rows = state.scan_service.recent_results(1, 10).await.unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn outage_is_recorded_on_the_domain() {
    let server = MockServer::start().await;
    let (store, _tmp) = create_test_sqlite_store().await;
    DomainRepository::update(store.as_ref(), &make_domain(1, "flaky"))
        .await
        .unwrap();

    let state = AppStateBuilder::new()
        .sqlite_store(Arc::clone(&store))
        .zone_provider(powerdns(&server))
        .prober(Arc::new(StaticProber::down()))
        .build()
        .unwrap();

    let summary = state.scan_service.scan_domain(1).await.unwrap();
    assert_eq!(summary.overall_health, OverallHealth::Down);

    let domain = DomainRepository::find_by_id(store.as_ref(), 1)
        .await
        .unwrap()
        .unwrap();
    assert!(domain.first_failed_at.is_some());
    assert!(!domain.is_suspended());
}

#[tokio::test]
async fn reconcile_pushes_rrset_and_marks_records() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(ZONE_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (store, _tmp) = create_test_sqlite_store().await;
    let domain = make_domain(1, "shop");
    DomainRepository::update(store.as_ref(), &domain).await.unwrap();
    let record = store.create(&make_record(1, "www", "192.0.2.10")).await.unwrap();

    let state = AppStateBuilder::new()
        .sqlite_store(Arc::clone(&store))
        .zone_provider(powerdns(&server))
        .build()
        .unwrap();

    state.reconciler.reconcile_record(&record, &domain).await.unwrap();

    let stored = DnsRecordRepository::find_by_id(store.as_ref(), record.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.synced);
    assert!(stored.last_synced_at.is_some());
    assert_eq!(store.count_unsynced_active(1).await.unwrap(), 0);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["rrsets"][0]["name"], "www.shop.example.net.");
    assert_eq!(body["rrsets"][0]["changetype"], "REPLACE");
}

#[tokio::test]
async fn failed_push_leaves_records_unsynced() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(ZONE_PATH))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(serde_json::json!({"error": "RRset www.shop.example.net. IN A: bad content"})),
        )
        .mount(&server)
        .await;

    let (store, _tmp) = create_test_sqlite_store().await;
    let domain = make_domain(1, "shop");
    DomainRepository::update(store.as_ref(), &domain).await.unwrap();
    let record = store.create(&make_record(1, "www", "192.0.2.10")).await.unwrap();

    let state = AppStateBuilder::new()
        .sqlite_store(Arc::clone(&store))
        .zone_provider(powerdns(&server))
        .build()
        .unwrap();

    assert!(state.reconciler.reconcile_record(&record, &domain).await.is_err());

    let stored = DnsRecordRepository::find_by_id(store.as_ref(), record.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.synced);
    assert!(stored.last_sync_error.is_some());
    let domain = DomainRepository::find_by_id(store.as_ref(), 1)
        .await
        .unwrap()
        .unwrap();
    assert!(!domain.dns_synced);
}

#[tokio::test]
async fn shutdown_stops_periodic_driver() {
    let server = MockServer::start().await;
    let (store, _tmp) = create_test_sqlite_store().await;
    let state = AppStateBuilder::new()
        .sqlite_store(store)
        .zone_provider(powerdns(&server))
        .prober(Arc::new(StaticProber::healthy()))
        .build()
        .unwrap();

    let scanner = Arc::clone(&state.scan_service);
    let driver = tokio::spawn(async move { scanner.run_periodic().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!state.is_shutting_down());
    state.shutdown();
    assert!(state.is_shutting_down());

    tokio::time::timeout(Duration::from_secs(5), driver)
        .await
        .expect("driver did not stop")
        .unwrap();
}
