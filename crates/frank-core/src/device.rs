//! The entry point: a device (or simulator) running an app with Frank embedded.
//!
//! A [`Device`] only stores connection coordinates. Every call builds a fresh
//! [`Request`] against `http://<host>:<port>`; there is no long-lived
//! connection state beyond the pooled HTTP client.
//!
//! # Example
//!
//! ```no_run
//! use frank_core::device::Device;
//! use frank_core::response::DeviceOrientation;
//! use frank_core::selector::{Term, UiQuery};
//!
//! # async fn example() -> Result<(), frank_core::error::FrankError> {
//! let device = Device::new("127.0.0.1", 32768);
//! if device.orientation().await? == DeviceOrientation::Portrait {
//!     let view = device.view(UiQuery::new([Term::from("tabBarButton"), Term::from(("marked", "Home"))]));
//!     view.touch().await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::instrument;

use crate::config::FrankConfig;
use crate::element::ViewNode;
use crate::error::FrankError;
use crate::request::{Request, DEFAULT_TIMEOUT};
use crate::response::{DeviceOrientation, Response};
use crate::selector::Selector;
use crate::view::View;

/// A device with an embedded Frank agent.
///
/// Cloning is cheap: the underlying HTTP client is reference counted.
#[derive(Debug, Clone)]
pub struct Device {
    host: String,
    port: u16,
    name: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl Device {
    /// Name used when none is given. Purely cosmetic.
    pub const DEFAULT_NAME: &'static str = "iPhone";

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            name: Self::DEFAULT_NAME.to_string(),
            timeout: DEFAULT_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &FrankConfig) -> Self {
        Self::new(config.host.clone(), config.port)
            .with_name(config.name.clone())
            .with_timeout(config.timeout())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the per-call timeout used by every request from this device.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Uses a preconfigured HTTP client (proxies, custom user agent, ...).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Rebuilds the HTTP client so that connecting gives up after
    /// `connect_timeout`, independently of the per-call timeout.
    pub fn with_connect_timeout(self, connect_timeout: Duration) -> Result<Self, FrankError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("frank-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FrankError::Client(e.to_string()))?;
        Ok(self.with_client(client))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Base URL of the agent.
    pub fn uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Creates a request bound to this device.
    pub fn request(&self) -> Request<'_> {
        Request::new(self)
    }

    /// Returns a view proxy for the views matched by `selector`.
    pub fn view<S: Selector + 'static>(&self, selector: S) -> View {
        View::new(Arc::new(selector), self.clone())
    }

    /// Returns the application's UI tree as raw JSON.
    #[instrument(skip(self), fields(device = %self.name))]
    pub async fn dump(&self) -> Result<Map<String, Value>, FrankError> {
        let dump = self.request().dump().await?;
        Ok(dump.into_payload().into_raw())
    }

    /// Returns the application's UI tree as typed [`ViewNode`]s.
    #[instrument(skip(self), fields(device = %self.name))]
    pub async fn dump_tree(&self) -> Result<ViewNode, FrankError> {
        self.request().dump().await?.tree()
    }

    /// Types `text` into the currently open keyboard.
    #[instrument(skip(self, text), fields(device = %self.name))]
    pub async fn type_into_keyboard(&self, text: &str) -> Result<(), FrankError> {
        self.request().type_into_keyboard(text).await
    }

    /// Returns whether accessibility is enabled in the app.
    #[instrument(skip(self), fields(device = %self.name))]
    pub async fn accessibility_check(&self) -> Result<bool, FrankError> {
        Ok(self.request().accessibility_check().await?.enabled())
    }

    /// Invokes `name` on the application delegate with `args`.
    ///
    /// Returns [`Response::Success`] or [`Response::Failure`] as reported by
    /// the agent.
    #[instrument(skip(self, args), fields(device = %self.name))]
    pub async fn app_exec(&self, name: &str, args: Vec<Value>) -> Result<Response, FrankError> {
        self.request().app_exec(name, args).await
    }

    /// Returns the current device orientation.
    ///
    /// An answer other than `portrait` or `landscape` is reported as
    /// [`FrankError::UnexpectedResponse`].
    #[instrument(skip(self), fields(device = %self.name))]
    pub async fn orientation(&self) -> Result<DeviceOrientation, FrankError> {
        let orientation = self.request().orientation().await?;
        orientation.orientation().ok_or_else(|| {
            FrankError::UnexpectedResponse(format!("unknown orientation: {}", orientation["orientation"]))
        })
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Device('{}',{},'{}')", self.host, self.port, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_formats_host_and_port() {
        let device = Device::new("127.0.0.1", 32768);
        assert_eq!(device.uri(), "http://127.0.0.1:32768");
    }

    #[test]
    fn defaults_and_builders() {
        let device = Device::new("localhost", 37265);
        assert_eq!(device.name(), "iPhone");
        assert_eq!(device.timeout(), DEFAULT_TIMEOUT);

        let device = device.with_name("iPad").with_timeout(Duration::from_secs(3));
        assert_eq!(device.name(), "iPad");
        assert_eq!(device.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn from_config_copies_every_field() {
        let config = FrankConfig {
            host: "10.0.0.5".into(),
            port: 40000,
            name: "Simulator".into(),
            timeout_secs: 7,
        };
        let device = Device::from_config(&config);
        assert_eq!(device.host(), "10.0.0.5");
        assert_eq!(device.port(), 40000);
        assert_eq!(device.name(), "Simulator");
        assert_eq!(device.timeout(), Duration::from_secs(7));
    }

    #[test]
    fn connect_timeout_keeps_coordinates() {
        let device = Device::new("10.0.0.5", 40000)
            .with_timeout(Duration::from_secs(4))
            .with_connect_timeout(Duration::from_secs(1))
            .unwrap();
        assert_eq!(device.uri(), "http://10.0.0.5:40000");
        assert_eq!(device.timeout(), Duration::from_secs(4));
    }

    #[test]
    fn display_matches_constructor_form() {
        let device = Device::new("127.0.0.1", 32768);
        assert_eq!(device.to_string(), "Device('127.0.0.1',32768,'iPhone')");
    }
}
