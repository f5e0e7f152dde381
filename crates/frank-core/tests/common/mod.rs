//! Shared test helpers for frank-core integration tests.
//!
//! A wiremock [`MockServer`] stands in for the Frank agent. Tests mount the
//! endpoints they need and point a [`Device`] at the server.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use frank_core::device::Device;

/// Start a mock agent and a device pointed at it.
pub async fn mock_agent() -> (MockServer, Device) {
    let server = MockServer::start().await;
    let device = device_for(&server);
    (server, device)
}

/// A device targeting the given mock server.
pub fn device_for(server: &MockServer) -> Device {
    let addr = server.address();
    Device::new(addr.ip().to_string(), addr.port()).with_name("Mock")
}

/// A port on localhost with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// A frankly `SUCCESS` envelope carrying `results`.
pub fn success(results: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "outcome": "SUCCESS", "results": results }))
}

/// A frankly `ERROR` envelope.
pub fn failure(reason: &str, details: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "outcome": "ERROR",
        "reason": reason,
        "details": details,
    }))
}

/// Mount a GET endpoint that answers after `delay`.
pub async fn mount_slow_get(server: &MockServer, endpoint: &str, delay: Duration, body: Value) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
        .mount(server)
        .await;
}
