mod harness;

use std::time::Duration;

use harness::config::ConfigBuilder;
use harness::eventually;
use harness::mock_llm::MockLlm;
use harness::server::TestServer;
use switchyard_client::{ProviderStatus, RegisterProvider};

#[tokio::test]
async fn test_call_reflects_backend_health() {
    let mock = MockLlm::start().await.unwrap();
    let config = ConfigBuilder::new()
        .with_mock_provider("mock", 0.01, &mock.base_url())
        .build();
    let server = TestServer::start(config).await.unwrap();

    let report = server.client().test_provider("mock", None).await.unwrap();
    assert!(report.healthy);
    assert!(report.error.is_none());
    assert_eq!(mock.request_count(), 1);

    mock.set_failing(true);
    let report = server.client().test_provider("mock", Some("hello")).await.unwrap();
    assert!(!report.healthy);
    assert!(report.error.is_some());

    let providers = server.client().providers().await.unwrap();
    let provider = providers.iter().find(|p| p.name == "mock").unwrap();
    assert_eq!(provider.total_requests, 2);
    assert_eq!(provider.consecutive_failures, 1);
    assert_eq!(provider.error_count, 1);
}

#[tokio::test]
async fn test_call_requires_probe_endpoint() {
    let config = ConfigBuilder::new().with_provider("catalog-only", 0.01).build();
    let server = TestServer::start(config).await.unwrap();

    let err = server.client().test_provider("catalog-only", None).await.unwrap_err();
    assert_eq!(err.error_type(), Some("invalid_request_error"));

    let err = server.client().test_provider("missing", None).await.unwrap_err();
    assert_eq!(err.error_type(), Some("not_found_error"));
}

#[tokio::test]
async fn background_probes_feed_the_monitor() {
    let mock = MockLlm::start().await.unwrap();
    let config = ConfigBuilder::new()
        .with_mock_provider("mock", 0.01, &mock.base_url())
        .with_probe_interval(1)
        .build();
    let server = TestServer::start(config).await.unwrap();

    assert!(eventually(Duration::from_secs(5), || mock.request_count() >= 1).await);

    let mut observed = 0;
    for _ in 0..50 {
        let providers = server.client().providers().await.unwrap();
        observed = providers.iter().find(|p| p.name == "mock").unwrap().total_requests;
        if observed > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(observed >= 1);
}

#[tokio::test]
async fn runtime_provider_is_tested_and_rechecked() {
    let mock = MockLlm::start().await.unwrap();
    let config = ConfigBuilder::new()
        .with_provider("openai", 0.03)
        .with_probe_interval(1)
        .build();
    let server = TestServer::start(config).await.unwrap();

    let registration = RegisterProvider {
        name: "late".to_owned(),
        cost_per_1k_tokens: 0.004,
        base_url: Some(mock.base_url()),
        api_key: Some("test-key".to_owned()),
        ..RegisterProvider::default()
    };
    let provider = server.client().register_provider(&registration).await.unwrap();
    assert_eq!(provider.name, "late");
    assert_eq!(provider.status, ProviderStatus::Active);
    assert_eq!(provider.total_requests, 0);

    let report = server.client().test_provider("late", None).await.unwrap();
    assert!(report.healthy);

    let err = server.client().register_provider(&registration).await.unwrap_err();
    assert_eq!(err.error_type(), Some("conflict_error"));

    // The onboarded provider joins the background rotation
    assert!(eventually(Duration::from_secs(5), || mock.request_count() >= 2).await);

    let providers = server.client().providers().await.unwrap();
    let late = providers.iter().find(|p| p.name == "late").unwrap();
    assert!(late.total_requests >= 1);
    assert!((late.cost_per_1k_tokens - 0.004).abs() < f64::EPSILON);
}

#[tokio::test]
async fn provider_without_endpoint_is_registered_but_untestable() {
    let config = ConfigBuilder::new().with_provider("openai", 0.03).build();
    let server = TestServer::start(config).await.unwrap();

    let registration = RegisterProvider {
        name: "catalog-late".to_owned(),
        cost_per_1k_tokens: 0.002,
        ..RegisterProvider::default()
    };
    server.client().register_provider(&registration).await.unwrap();

    let available = server.client().available_providers("openai").await.unwrap();
    assert!(available.iter().any(|p| p.name == "catalog-late"));

    let err = server.client().test_provider("catalog-late", None).await.unwrap_err();
    assert_eq!(err.error_type(), Some("invalid_request_error"));
}
