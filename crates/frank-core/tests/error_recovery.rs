//! Error classification tests for the request pipeline.
//!
//! These tests exercise timeouts, refused connections, HTTP errors, empty and
//! corrupt bodies, and locally rejected calls. Every failing request must
//! still reach the complete state exactly once.

mod common;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{any, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{closed_port, mock_agent, mount_slow_get};

use frank_core::device::Device;
use frank_core::error::FrankError;
use frank_core::frank_call;
use frank_core::selector::UiQuery;

// ---------------------------------------------------------------------------
// 1. Agent too slow -> Timeout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_slow_agent_times_out() {
    let (server, device) = mock_agent().await;
    mount_slow_get(&server, "/orientation", Duration::from_secs(5), json!({"orientation": "portrait"})).await;
    let device = device.with_timeout(Duration::from_millis(100));

    let req = device.request();
    let err = req.orientation().await.unwrap_err();

    assert!(matches!(err, FrankError::Timeout { .. }), "expected Timeout, got: {err:?}");
    assert!(req.is_complete(), "request should be complete after a timeout");
    assert_eq!(req.completions(), 1, "completion should be signalled exactly once");
    assert!(req.last_error().unwrap().contains("timed out"));
}

// ---------------------------------------------------------------------------
// 2. Nothing listening -> Connection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_refused_connection() {
    let device = Device::new("127.0.0.1", closed_port()).with_timeout(Duration::from_secs(2));

    let req = device.request();
    let err = req.dump().await.unwrap_err();

    assert!(matches!(err, FrankError::Connection { .. }), "expected Connection, got: {err:?}");
    assert!(err.is_transport());
    assert_eq!(req.completions(), 1);
}

// ---------------------------------------------------------------------------
// 3. Non-2xx status -> Http
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_server_error_status() {
    let (server, device) = mock_agent().await;

    Mock::given(method("POST"))
        .and(path("/map"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let view = device.view(UiQuery::new(["button"]));
    let err = view.touch().await.unwrap_err();
    match err {
        FrankError::Http { status, url } => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/map"));
        }
        other => panic!("expected Http, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_fire_and_forget_still_reports_http_errors() {
    let (server, device) = mock_agent().await;

    Mock::given(method("POST"))
        .and(path("/type_into_keyboard"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = device.type_into_keyboard("abc").await.unwrap_err();
    assert!(matches!(err, FrankError::Http { status: 404, .. }));
}

// ---------------------------------------------------------------------------
// 4. Empty or corrupt bodies
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_empty_body_where_one_is_expected() {
    let (server, device) = mock_agent().await;

    Mock::given(method("GET"))
        .and(path("/dump"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let req = device.request();
    let err = req.dump().await.unwrap_err();
    assert!(matches!(err, FrankError::EmptyResponse { .. }), "got: {err:?}");
    assert!(req.is_complete());
}

#[tokio::test]
async fn test_garbage_body_is_json_error() {
    let (server, device) = mock_agent().await;

    Mock::given(method("GET"))
        .and(path("/accessibility_check"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = device.accessibility_check().await.unwrap_err();
    assert!(matches!(err, FrankError::Json(_)), "got: {err:?}");
    assert!(!err.is_transport());
}

#[tokio::test]
async fn test_unknown_orientation_is_unexpected() {
    let (server, device) = mock_agent().await;

    Mock::given(method("GET"))
        .and(path("/orientation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"orientation": "face_up"})))
        .mount(&server)
        .await;

    let err = device.orientation().await.unwrap_err();
    match err {
        FrankError::UnexpectedResponse(msg) => assert!(msg.contains("face_up")),
        other => panic!("expected UnexpectedResponse, got: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// 5. Locally rejected calls never reach the agent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_reserved_method_never_sent() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let device = common::device_for(&server);

    let view = device.view(UiQuery::new(["button"]));
    let err = frank_call!(view._secret()).await.unwrap_err();
    assert!(matches!(err, FrankError::Argument(_)));
    let err = view.invoke("", Vec::new()).await.unwrap_err();
    assert!(matches!(err, FrankError::Argument(_)));
}

#[tokio::test]
async fn test_private_selector_sent_explicitly() {
    let (server, device) = mock_agent().await;
    Mock::given(method("POST"))
        .and(path("/map"))
        .and(body_json(json!({
            "query": "textField",
            "operation": {"method_name": "_setText:", "arguments": ["x"]},
            "selector_engine": "uiquery"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"outcome": "SUCCESS", "results": [null]})))
        .expect(1)
        .mount(&server)
        .await;

    let view = device.view(UiQuery::new(["textField"]));
    let response = view.send_message("_setText:", vec![json!("x")]).await.unwrap();
    assert!(response.is_success());

    assert!(matches!(
        frank_call!(view._setText("x")).await,
        Err(FrankError::Argument(_))
    ));
}

// ---------------------------------------------------------------------------
// 6. A request can be reused after a failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_request_reusable_after_failure() {
    let (server, device) = mock_agent().await;

    Mock::given(method("GET"))
        .and(path("/orientation"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orientation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"orientation": "portrait"})))
        .mount(&server)
        .await;

    let req = device.request();
    assert!(req.orientation().await.is_err());
    assert!(req.last_error().unwrap().contains("503"));

    let orientation = req.orientation().await.unwrap();
    assert_eq!(orientation.name(), Some("portrait"));
    assert_eq!(req.completions(), 2);
    assert!(req.last_error().is_none(), "a successful execution clears the previous error");
}
