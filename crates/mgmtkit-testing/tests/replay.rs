//! Integration tests for the replay harness.
//!
//! Each test starts a real listener on a free loopback port and talks to it
//! with reqwest:
//! - Recorded responses served in order, then `500 No more requests expected.`
//! - Validation faults carried back through the exception manager
//! - The listening address released on stop
//! - Record mode forwarding to a live service

use mgmtkit_core::prelude::*;
use mgmtkit_testing::assertions::{assert_fault_at, assert_no_fault, assert_no_more_requests};
use mgmtkit_testing::fixtures::{self, TEST_USER_AGENT};
use mgmtkit_testing::prelude::*;
use mgmtkit_testing::{NO_MORE_REQUESTS, init_tracing};
use pretty_assertions::assert_eq;
use url::Url;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(TEST_USER_AGENT)
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}

fn ping_session() -> HttpSession {
    HttpSession::new("UnitTests.Ping")
        .with_exchange(
            HttpRequest::new("GET", "/ping").with_header("User-Agent", TEST_USER_AGENT),
            HttpResponse::new(200).with_body("pong"),
        )
        .with_exchange(
            HttpRequest::new("DELETE", "/ping/1").with_header("User-Agent", TEST_USER_AGENT),
            HttpResponse::new(204),
        )
}

fn url(server: &MockHttpServer, path: &str) -> Url {
    server.uri().join(path).unwrap()
}

// =============================================================================
// Replay
// =============================================================================

#[tokio::test]
async fn test_serves_recorded_responses_in_order() {
    init_tracing();
    let exceptions = ExceptionManager::new();
    let server = MockHttpServer::start_with_config(
        &exceptions,
        MockServerConfig::ephemeral(),
        ping_session(),
    )
    .unwrap();
    let client = client();

    let first = client.get(url(&server, "ping")).send().await.unwrap();
    assert_eq!(first.status().as_u16(), 200);
    assert_eq!(first.text().await.unwrap(), "pong");

    let second = client.delete(url(&server, "ping/1")).send().await.unwrap();
    assert_eq!(second.status().as_u16(), 204);

    let report = server.stop().unwrap();
    report.assert_all_consumed();
    assert_no_fault(exceptions);
}

#[tokio::test]
async fn test_request_past_recording_gets_500_and_fault() {
    init_tracing();
    let mut exceptions = ExceptionManager::new();
    let server = MockHttpServer::start_with_config(
        &exceptions,
        MockServerConfig::ephemeral(),
        ping_session(),
    )
    .unwrap();
    let client = client();

    client.get(url(&server, "ping")).send().await.unwrap();
    client.delete(url(&server, "ping/1")).send().await.unwrap();
    let extra = client.get(url(&server, "ping")).send().await.unwrap();
    assert_eq!(extra.status().as_u16(), 500);
    assert_eq!(extra.text().await.unwrap(), NO_MORE_REQUESTS);

    let report = server.stop().unwrap();
    assert_eq!(report.served, 3);
    assert_eq!(report.expected, 2);
    assert!(!report.all_consumed());

    assert_no_more_requests(&mut exceptions, 2);
    assert_no_fault(exceptions);
}

#[tokio::test]
async fn test_method_mismatch_still_returns_recorded_response() {
    init_tracing();
    let mut exceptions = ExceptionManager::new();
    let server = MockHttpServer::start_with_config(
        &exceptions,
        MockServerConfig::ephemeral(),
        ping_session(),
    )
    .unwrap();

    let response = client().post(url(&server, "ping")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    drop(server);

    let fault = assert_fault_at(&mut exceptions, 0, "POST");
    assert!(matches!(fault.error, ValidationError::MethodMismatch { .. }));
    assert_eq!(fault.session, "UnitTests.Ping");
}

#[tokio::test]
async fn test_user_agent_mismatch_fails_finish() {
    init_tracing();
    let exceptions = ExceptionManager::new();
    let server = MockHttpServer::start_with_config(
        &exceptions,
        MockServerConfig::ephemeral(),
        ping_session(),
    )
    .unwrap();

    reqwest::Client::builder()
        .user_agent("someone-else/1.0")
        .build()
        .unwrap()
        .get(url(&server, "ping"))
        .send()
        .await
        .unwrap();
    server.stop().unwrap();

    let fault = exceptions.finish().unwrap_err();
    assert!(matches!(
        fault.error,
        ValidationError::UserAgentMismatch { index: 0, .. }
    ));
}

#[tokio::test]
#[should_panic(expected = "replay of session 'UnitTests.Ping' failed")]
async fn test_unfinished_fault_panics_on_drop() {
    let exceptions = ExceptionManager::new();
    let server = MockHttpServer::start_with_config(
        &exceptions,
        MockServerConfig::ephemeral(),
        ping_session(),
    )
    .unwrap();
    client().put(url(&server, "ping")).send().await.unwrap();
    server.stop().unwrap();
}

#[tokio::test]
async fn test_panicking_validator_becomes_assertion_fault() {
    init_tracing();
    let mut exceptions = ExceptionManager::new();
    let session = ping_session().with_validator(
        |_: usize, _: Option<&HttpMessage>, _: &HttpRequest| -> Result<(), ValidationError> {
            panic!("validator exploded")
        },
    );
    let server =
        MockHttpServer::start_with_config(&exceptions, MockServerConfig::ephemeral(), session)
            .unwrap();

    let response = client().get(url(&server, "ping")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    server.stop().unwrap();

    let fault = assert_fault_at(&mut exceptions, 0, "validator exploded");
    assert!(matches!(fault.error, ValidationError::Assertion { .. }));
}

#[tokio::test]
async fn test_fixture_session_with_odata_validator() {
    init_tracing();
    let exceptions = ExceptionManager::new();
    let session = fixtures::get_missing_database_session().with_validator(fixtures::odata_validator());
    let server =
        MockHttpServer::start_with_config(&exceptions, MockServerConfig::ephemeral(), session)
            .unwrap();

    let response = client()
        .get(url(
            &server,
            "/v1/ManagementService.svc/Servers('testserver')/Databases()?$filter=Name%20eq%20'testdb3'",
        ))
        .header("Accept", "application/json;odata=minimalmetadata")
        .header("DataServiceVersion", "3.0;NetFx")
        .header("MaxDataServiceVersion", "3.0;NetFx")
        .header("x-ms-client-session-id", "live-session")
        .header("x-ms-client-request-id", "live-request")
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "value": [] }));

    server.stop().unwrap().assert_all_consumed();
    assert_no_fault(exceptions);
}

#[tokio::test]
async fn test_oversized_body_is_rejected_and_reported() {
    init_tracing();
    let mut exceptions = ExceptionManager::new();
    let session = HttpSession::new("UnitTests.Upload").with_exchange(
        HttpRequest::new("POST", "/upload").with_header("User-Agent", TEST_USER_AGENT),
        HttpResponse::new(202),
    );
    let config = MockServerConfig::ephemeral().with_max_body_size(4);
    let server = MockHttpServer::start_with_config(&exceptions, config, session).unwrap();

    let response = client()
        .post(url(&server, "upload"))
        .body("0123456789")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 413);

    let report = server.stop().unwrap();
    assert_eq!((report.served, report.expected), (1, 1));

    let fault = assert_fault_at(&mut exceptions, 0, "request body rejected");
    assert!(matches!(fault.error, ValidationError::Custom { .. }));
    assert_no_fault(exceptions);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_address_released_after_stop() {
    init_tracing();
    let exceptions = ExceptionManager::new();
    let first =
        MockHttpServer::start_with_config(&exceptions, MockServerConfig::ephemeral(), ping_session())
            .unwrap();
    let address = first.address();
    client().get(url(&first, "ping")).send().await.unwrap();
    first.stop().unwrap();

    let prefix = format!("http://{address}/");
    let second = MockHttpServer::start(&exceptions, &prefix, ping_session()).unwrap();
    assert_eq!(second.address(), address);
    assert!(second.is_listening());

    let response = client().get(url(&second, "ping")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    drop(second);

    assert_no_fault(exceptions);
}

#[tokio::test]
async fn test_second_listener_on_same_address_fails() {
    init_tracing();
    let exceptions = ExceptionManager::new();
    let first =
        MockHttpServer::start_with_config(&exceptions, MockServerConfig::ephemeral(), ping_session())
            .unwrap();

    let prefix = format!("http://{}/", first.address());
    let err = MockHttpServer::start(&exceptions, &prefix, ping_session()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Connection);
    assert_eq!(first.served(), 0);
}

#[test]
fn test_uri_reports_bound_port() {
    let exceptions = ExceptionManager::new();
    let server =
        MockHttpServer::start_with_config(&exceptions, MockServerConfig::ephemeral(), ping_session())
            .unwrap();
    assert_ne!(server.uri().port(), Some(0));
    assert_eq!(server.uri().port(), Some(server.address().port()));
    assert_eq!(server.session_name(), "UnitTests.Ping");
}

// =============================================================================
// Record mode
// =============================================================================

#[tokio::test]
async fn test_record_mode_forwards_and_captures() {
    init_tracing();
    let exceptions = ExceptionManager::new();
    let live =
        MockHttpServer::start_with_config(&exceptions, MockServerConfig::ephemeral(), ping_session())
            .unwrap();
    let recorder = MockHttpServer::start_with_config(
        &exceptions,
        MockServerConfig::ephemeral().recording(live.uri().clone()),
        HttpSession::new("UnitTests.Ping"),
    )
    .unwrap();

    let client = client();
    let first = client.get(url(&recorder, "ping")).send().await.unwrap();
    assert_eq!(first.text().await.unwrap(), "pong");
    let second = client.delete(url(&recorder, "ping/1")).send().await.unwrap();
    assert_eq!(second.status().as_u16(), 204);

    let report = recorder.stop().unwrap();
    let recorded = report.recorded.unwrap();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded.settings.service_base_uri.as_ref(), Some(live.uri()));
    assert_eq!(recorded.messages[1].request.method, "DELETE");
    assert_eq!(recorded.messages[0].response.body, "pong");

    SessionDiff::compare(&ping_session(), &recorded).assert_identical();
    live.stop().unwrap().assert_all_consumed();
    assert_no_fault(exceptions);
}

#[tokio::test]
async fn test_record_mode_reports_unreachable_upstream() {
    init_tracing();
    let mut exceptions = ExceptionManager::new();
    let closed = {
        let probe = MockHttpServer::start_with_config(
            &exceptions,
            MockServerConfig::ephemeral(),
            HttpSession::new("UnitTests.Probe"),
        )
        .unwrap();
        let uri = probe.uri().clone();
        probe.stop().unwrap();
        uri
    };
    let recorder = MockHttpServer::start_with_config(
        &exceptions,
        MockServerConfig::ephemeral().recording(closed),
        HttpSession::new("UnitTests.Unreachable"),
    )
    .unwrap();

    let response = client().get(url(&recorder, "ping")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 502);
    let report = recorder.stop().unwrap();
    assert_eq!(report.recorded.map(|s| s.len()), Some(0));

    assert_fault_at(&mut exceptions, 0, "upstream request failed");
    assert_no_fault(exceptions);
}
