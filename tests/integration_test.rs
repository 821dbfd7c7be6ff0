//! Integration Tests - End-to-end Engine Testing
//!
//! Drives the engine with JSON snapshot fixtures and checks the
//! resulting registries, merge output and scrape cycle. Uses mockall
//! for port mocking and tokio::test for async tests.

use std::sync::Arc;
use std::time::Duration;

use mockall::mock;

use gateway_metrics_exporter::domain::{
    FamilyDesc, LabelSet, MetricKind, MetricsError, Outcome, OutcomeExt, Registry,
    ServiceSnapshot, SharedRegistry, SystemOverviewSnapshot,
};
use gateway_metrics_exporter::usecases::{
    EngineOptions, MergeOptions, Merged, MetricsEngine, ScrapeCycle,
};

// ---- Mock Definitions ----

mock! {
    pub Source {}

    #[async_trait::async_trait]
    impl gateway_metrics_exporter::ports::snapshot_source::SnapshotSource for Source {
        async fn system_overview(&self) -> anyhow::Result<Option<SystemOverviewSnapshot>>;
        async fn service_metrics(&self) -> anyhow::Result<Option<ServiceSnapshot>>;
    }
}

mock! {
    pub Sink {}

    #[async_trait::async_trait]
    impl gateway_metrics_exporter::ports::metrics_sink::MetricsSink for Sink {
        async fn publish(&self, exposition: &str) -> anyhow::Result<()>;
    }
}

// ---- Fixtures ----

fn system_overview_fixture() -> SystemOverviewSnapshot {
    serde_json::from_str(include_str!("fixtures/system_overview.json")).unwrap()
}

fn service_fixture() -> ServiceSnapshot {
    serde_json::from_str(include_str!("fixtures/service_metrics.json")).unwrap()
}

fn single_gauge_registry(name: &str, help: &str, value: f64) -> SharedRegistry {
    let mut registry = Registry::new();
    registry.register_family(FamilyDesc::gauge(name, help)).unwrap();
    registry.set_sample(name, LabelSet::new(), value).unwrap();
    registry.into()
}

fn values(registry: &Registry, name: &str) -> Vec<(LabelSet, f64)> {
    registry
        .family(name)
        .unwrap()
        .samples()
        .iter()
        .map(|s| (s.labels.clone(), s.value))
        .collect()
}

// ---- System overview ----

#[test]
fn test_system_overview_missing_parameter() {
    let engine = MetricsEngine::new(EngineOptions::default());
    let result = engine.process_system_overview_metrics(None);

    assert_eq!(result.outcome(), Outcome::Error);
    assert_eq!(
        result.unwrap_err().to_string(),
        "Missing required parameter systemOverviewMetrics"
    );
}

#[test]
fn test_system_overview_collects_metrics() {
    let engine = MetricsEngine::new(EngineOptions::default());
    let result = engine.process_system_overview_metrics(Some(&system_overview_fixture()));
    assert_eq!(result.outcome(), Outcome::Next);

    let shared = result.unwrap();
    let registry = shared.read();

    let cpu = registry.family("gateway_instance_cpu").unwrap();
    assert_eq!(cpu.kind(), MetricKind::Gauge);
    assert_eq!(
        values(&registry, "gateway_instance_cpu"),
        vec![
            (LabelSet::instance("instance-50"), 0.0),
            (LabelSet::instance("instance-1"), 1.0),
        ]
    );
    assert!(registry.family("gateway_instance_disk_used").is_some());

    // Average CPU only reported by one instance
    assert_eq!(registry.family("gateway_instance_cpu_avg").unwrap().len(), 1);

    let success = values(&registry, "api_requests_success");
    assert_eq!(success.len(), 2);
    assert_eq!(
        success[0],
        (LabelSet::instance_service("traffic-7cb4f6989f-bjw8n", "Petstore"), 20.0)
    );
    assert_eq!(values(&registry, "api_requests_failures").len(), 2);
    assert_eq!(values(&registry, "api_requests_exceptions").len(), 2);
}

// ---- Service ----

#[test]
fn test_service_missing_parameter() {
    let engine = MetricsEngine::new(EngineOptions::default());
    let result = engine.process_service_metrics(None);

    assert_eq!(result.outcome(), Outcome::Error);
    assert_eq!(
        result.unwrap_err(),
        MetricsError::MissingParameter("serviceMetrics")
    );
}

#[test]
fn test_service_updates_registry() {
    let engine = MetricsEngine::new(EngineOptions::default());
    let result = engine.process_service_metrics(Some(&service_fixture()));
    assert_eq!(result.outcome(), Outcome::Next);

    let shared = result.unwrap();
    let registry = shared.read();

    let total = registry.family("api_requests_total").unwrap();
    assert_eq!(total.kind(), MetricKind::Counter);
    assert_eq!(total.len(), 4);

    let expected = [
        (LabelSet::instance_service("instance-1", "Greeting API"), [2078.0, 30.0, 1.0]),
        (LabelSet::instance_service("instance-1", "Petstore"), [888.0, 4.0, 1.0]),
        (LabelSet::instance_service("instance-2", "FHIR CarePlan"), [6.0, 0.0, 0.0]),
    ];
    let success = values(&registry, "api_requests_success");
    let failures = values(&registry, "api_requests_failures");
    let exceptions = values(&registry, "api_requests_exceptions");

    for (i, (labels, [s, f, e])) in expected.iter().enumerate() {
        assert_eq!(success[i], (labels.clone(), *s));
        assert_eq!(failures[i], (labels.clone(), *f));
        assert_eq!(exceptions[i], (labels.clone(), *e));
    }
}

#[test]
fn test_repeated_service_calls_keep_one_series_per_pair() {
    let engine = MetricsEngine::new(EngineOptions::default());
    engine.process_service_metrics(Some(&service_fixture())).unwrap();
    engine.process_service_metrics(Some(&service_fixture())).unwrap();

    let registry = engine.service_registry().snapshot();
    assert_eq!(registry.family("api_requests_success").unwrap().len(), 4);
    assert_eq!(
        registry
            .get_sample(
                "api_requests_success",
                &LabelSet::instance_service("instance-1", "Greeting API")
            )
            .unwrap(),
        2078.0
    );
}

// ---- Merge ----

fn engine_with_two_registries() -> MetricsEngine {
    MetricsEngine::new(EngineOptions {
        registries: vec![
            single_gauge_registry("registry1_metric", "A sample metric for registry 1", 1.0),
            single_gauge_registry("registry2_metric", "A sample metric for registry 2", 2.0),
        ],
        ..EngineOptions::default()
    })
}

#[test]
fn test_merge_two_registries() {
    let engine = engine_with_two_registries();
    let result = engine.merge_registries(MergeOptions::default());
    assert_eq!(result.outcome(), Outcome::Next);

    let merged = result.unwrap();
    let registry = merged.registry().unwrap();
    assert!(registry.family("registry1_metric").is_some());
    assert!(registry.family("registry2_metric").is_some());
}

#[test]
fn test_merge_two_registries_returns_metrics() {
    let engine = engine_with_two_registries();
    let merged = engine
        .merge_registries(MergeOptions { return_metrics: true })
        .unwrap();

    assert_eq!(
        merged,
        Merged::Text(include_str!("fixtures/expected_merged.txt").to_string())
    );
}

#[test]
fn test_merge_conflicting_injected_registry() {
    let engine = MetricsEngine::new(EngineOptions {
        registries: vec![
            single_gauge_registry("shared_metric", "First help", 1.0),
            single_gauge_registry("shared_metric", "Second help", 2.0),
        ],
        ..EngineOptions::default()
    });

    let result = engine.merge_registries(MergeOptions::default());
    assert_eq!(result.outcome(), Outcome::Error);
    assert!(matches!(result.unwrap_err(), MetricsError::Conflict { .. }));
}

#[test]
fn test_overview_and_service_counters_merge_without_conflict() {
    let engine = MetricsEngine::new(EngineOptions::default());
    engine
        .process_system_overview_metrics(Some(&system_overview_fixture()))
        .unwrap();
    engine.process_service_metrics(Some(&service_fixture())).unwrap();

    let merged = engine.merge_registries(MergeOptions::default()).unwrap();
    let registry = merged.registry().unwrap();

    // 2 legacy series from the overview + 4 from the service snapshot
    assert_eq!(registry.family("api_requests_success").unwrap().len(), 6);
    assert_eq!(registry.family("api_requests_total").unwrap().len(), 4);
}

// ---- Scrape cycle ----

#[tokio::test]
async fn test_scrape_cycle_publishes_rendered_text() {
    let mut source = MockSource::new();
    source
        .expect_system_overview()
        .times(1)
        .returning(|| Ok(Some(system_overview_fixture())));
    source
        .expect_service_metrics()
        .times(1)
        .returning(|| Ok(None));

    let mut sink = MockSink::new();
    sink.expect_publish()
        .withf(|text: &str| {
            text.contains("# TYPE gateway_instance_cpu gauge\n")
                && text.contains("gateway_instance_cpu{instance=\"instance-1\"} 1\n")
        })
        .times(1)
        .returning(|_| Ok(()));

    let engine = Arc::new(MetricsEngine::new(EngineOptions::default()));
    let cycle = ScrapeCycle::new(
        Arc::new(source),
        Arc::new(sink),
        engine,
        Duration::from_secs(60),
    );

    let report = cycle.run_once().await.unwrap();
    assert_eq!(report.system_overview, Some(Outcome::Next));
    assert_eq!(report.service, None);
    assert!(report.bytes > 0);
}

#[tokio::test]
async fn test_scrape_cycle_reports_mapper_error_and_still_publishes() {
    let mut source = MockSource::new();
    source
        .expect_system_overview()
        .returning(|| Ok(None));
    source
        .expect_service_metrics()
        .returning(|| Ok(Some(ServiceSnapshot::default())));

    let mut sink = MockSink::new();
    sink.expect_publish().times(1).returning(|_| Ok(()));

    let engine = Arc::new(MetricsEngine::new(EngineOptions::default()));
    let cycle = ScrapeCycle::new(
        Arc::new(source),
        Arc::new(sink),
        engine,
        Duration::from_secs(60),
    );

    let report = cycle.run_once().await.unwrap();
    assert_eq!(report.service, Some(Outcome::Error));
}

#[tokio::test]
async fn test_scrape_cycle_fetch_failure() {
    let mut source = MockSource::new();
    source
        .expect_system_overview()
        .returning(|| Err(anyhow::anyhow!("upstream unavailable")));

    let mut sink = MockSink::new();
    sink.expect_publish().never();

    let engine = Arc::new(MetricsEngine::new(EngineOptions::default()));
    let cycle = ScrapeCycle::new(
        Arc::new(source),
        Arc::new(sink),
        engine,
        Duration::from_secs(60),
    );

    assert!(cycle.run_once().await.is_err());
}

#[tokio::test]
async fn test_scrape_cycle_stops_on_shutdown() {
    let mut source = MockSource::new();
    source.expect_system_overview().returning(|| Ok(None));
    source.expect_service_metrics().returning(|| Ok(None));
    let mut sink = MockSink::new();
    sink.expect_publish().returning(|_| Ok(()));

    let engine = Arc::new(MetricsEngine::new(EngineOptions::default()));
    let cycle = ScrapeCycle::new(
        Arc::new(source),
        Arc::new(sink),
        engine,
        Duration::from_secs(3600),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    shutdown_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), cycle.run(shutdown_rx)).await;
    assert!(result.is_ok(), "cycle should stop on shutdown");
}
