//! HTTP dispatch to the Frank agent.
//!
//! A [`Request`] performs one round-trip against one of the fixed agent
//! endpoints (the [`Query`] descriptors below) and decodes the body with the
//! endpoint's parser. Requests are cheap and meant to be created per call via
//! [`Device::request`](crate::device::Device::request).
//!
//! Each execution moves the request from *pending* to *complete*. The
//! transition happens on every exit path, including errors and cancellation,
//! and can be observed from another task through a [`Completion`] handle.
//!
//! # Example
//!
//! ```no_run
//! use frank_core::device::Device;
//! use frank_core::operation::Operation;
//! use frank_core::selector::UiQuery;
//!
//! # async fn example() -> Result<(), frank_core::error::FrankError> {
//! let device = Device::new("127.0.0.1", 37265);
//! let request = device.request();
//! let response = request
//!     .map(&UiQuery::new(["button marked:'Login'"]), &Operation::new("touch", vec![]))
//!     .await?;
//! assert!(request.is_complete());
//! println!("{response}");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, debug_span, trace, warn, Instrument};

use crate::device::Device;
use crate::error::FrankError;
use crate::operation::Operation;
use crate::response::{Accessibility, Dump, Orientation, Response};
use crate::selector::Selector;

/// Per-call timeout used when the device does not override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

// ---------------------------------------------------------------------------
// Endpoint descriptors
// ---------------------------------------------------------------------------

/// Decodes a response body into `T`.
pub type Parser<T> = fn(&str) -> Result<T, FrankError>;

/// An agent endpoint: its path and, if the body matters, how to parse it.
pub struct Query<T> {
    path: &'static str,
    parser: Option<Parser<T>>,
}

impl<T> Query<T> {
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Returns `false` for fire-and-forget endpoints whose body is discarded.
    pub fn has_parser(&self) -> bool {
        self.parser.is_some()
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("path", &self.path)
            .field("has_parser", &self.has_parser())
            .finish()
    }
}

/// Apply an [`Operation`] to every view matched by a selector.
pub const MAP: Query<Response> = Query {
    path: "/map",
    parser: Some(Response::parse),
};

/// Invoke a method on the application delegate.
pub const APP_EXEC: Query<Response> = Query {
    path: "/app_exec",
    parser: Some(Response::parse),
};

/// Type into the on-screen keyboard. The agent's answer is ignored.
pub const TYPE_KEYBOARD: Query<()> = Query {
    path: "/type_into_keyboard",
    parser: None,
};

pub const ACCESSIBILITY: Query<Accessibility> = Query {
    path: "/accessibility_check",
    parser: Some(Accessibility::parse),
};

pub const DUMP: Query<Dump> = Query {
    path: "/dump",
    parser: Some(Dump::parse),
};

pub const ORIENTATION: Query<Orientation> = Query {
    path: "/orientation",
    parser: Some(Orientation::parse),
};

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// A request body. Text is sent verbatim; JSON values are encoded first.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Json(Value),
}

impl Body {
    fn encode(self) -> Result<(String, &'static str), FrankError> {
        match self {
            Body::Text(text) => Ok((text, "text/plain; charset=utf-8")),
            Body::Json(value) => Ok((serde_json::to_string(&value)?, "application/json")),
        }
    }

    /// The selector query carried by a `/map` body, used to label timings.
    fn query_label(&self) -> Option<&str> {
        match self {
            Body::Json(value) => value.get("query").and_then(Value::as_str),
            Body::Text(_) => None,
        }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

#[derive(Serialize)]
struct MapRequest<'a> {
    query: String,
    operation: &'a Operation,
    selector_engine: &'a str,
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// A handle for waiting on a [`Request`] from another task.
#[derive(Debug, Clone)]
pub struct Completion {
    rx: watch::Receiver<bool>,
}

impl Completion {
    pub fn is_complete(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until the request completes. Returns `false` if `timeout`
    /// elapsed first, or if the request was dropped while still pending.
    pub async fn wait(&mut self, timeout: Option<Duration>) -> bool {
        let done = self.rx.wait_for(|complete| *complete);
        match timeout {
            Some(limit) => matches!(tokio::time::timeout(limit, done).await, Ok(Ok(_))),
            None => done.await.is_ok(),
        }
    }
}

/// Marks the request complete when dropped, whichever way `execute` exits.
struct CompletionGuard<'a> {
    complete: &'a watch::Sender<bool>,
    completions: &'a AtomicUsize,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.completions.fetch_add(1, Ordering::SeqCst);
        self.complete.send_replace(true);
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A single call to the agent running on `device`.
pub struct Request<'d> {
    device: &'d Device,
    complete: watch::Sender<bool>,
    completions: AtomicUsize,
    error: Mutex<Option<String>>,
}

impl<'d> Request<'d> {
    pub fn new(device: &'d Device) -> Self {
        let (complete, _) = watch::channel(false);
        Self {
            device,
            complete,
            completions: AtomicUsize::new(0),
            error: Mutex::new(None),
        }
    }

    pub fn device(&self) -> &Device {
        self.device
    }

    pub fn completion(&self) -> Completion {
        Completion {
            rx: self.complete.subscribe(),
        }
    }

    pub fn is_complete(&self) -> bool {
        *self.complete.borrow()
    }

    /// Waits for the current execution to complete. See [`Completion::wait`].
    pub async fn wait(&self, timeout: Option<Duration>) -> bool {
        self.completion().wait(timeout).await
    }

    /// Number of executions that have reached the complete state.
    pub fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }

    /// Description of the error that ended the most recent execution, or
    /// `None` if it succeeded. Each execution clears the previous error.
    pub fn last_error(&self) -> Option<String> {
        self.error.lock().ok().and_then(|slot| slot.clone())
    }

    /// Sends `body` to the endpoint described by `query` and parses the reply.
    ///
    /// Uses `POST` when a body is present and `GET` otherwise. Returns
    /// `Ok(None)` for endpoints without a parser. Transport failures are
    /// mapped to [`FrankError::Timeout`], [`FrankError::Connection`] or
    /// [`FrankError::Http`]; an empty body where one is expected is
    /// [`FrankError::EmptyResponse`].
    pub async fn execute<T>(
        &self,
        query: &Query<T>,
        body: Option<Body>,
        timeout: Duration,
    ) -> Result<Option<T>, FrankError> {
        self.complete.send_replace(false);
        if let Ok(mut slot) = self.error.lock() {
            *slot = None;
        }
        let _guard = CompletionGuard {
            complete: &self.complete,
            completions: &self.completions,
        };

        let span = debug_span!("frank_request", path = query.path);
        let result = self.dispatch(query, body, timeout).instrument(span).await;
        if let Err(err) = &result {
            self.record_error(err);
        }
        result
    }

    async fn dispatch<T>(
        &self,
        query: &Query<T>,
        body: Option<Body>,
        timeout: Duration,
    ) -> Result<Option<T>, FrankError> {
        let url = format!("{}{}", self.device.uri(), query.path);
        let label = body
            .as_ref()
            .and_then(Body::query_label)
            .map_or_else(|| url.clone(), str::to_string);

        let builder = match body.map(Body::encode).transpose()? {
            Some((text, content_type)) => {
                debug!(%url, body = %text, "executing request");
                self.device.client().post(&url).header(CONTENT_TYPE, content_type).body(text)
            }
            None => {
                debug!(%url, "executing request");
                self.device.client().get(&url)
            }
        };

        let started = Instant::now();
        let response = builder
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FrankError::from_transport(&url, e))?;
        debug!(
            query = %label,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "query finished"
        );

        let status = response.status();
        if !status.is_success() {
            return Err(FrankError::Http {
                url,
                status: status.as_u16(),
            });
        }

        let Some(parse) = query.parser else {
            return Ok(None);
        };

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FrankError::from_transport(&url, e))?;
        if bytes.is_empty() {
            return Err(FrankError::EmptyResponse { url });
        }
        let text = std::str::from_utf8(&bytes).map_err(|e| {
            FrankError::UnexpectedResponse(format!("body from {url} is not UTF-8: {e}"))
        })?;
        trace!(body = text, "response body");

        parse(text).map(Some)
    }

    fn record_error(&self, err: &FrankError) {
        warn!(error = %err, "frank request failed");
        if let Ok(mut slot) = self.error.lock() {
            *slot = Some(err.to_string());
        }
    }

    async fn execute_parsed<T>(&self, query: &Query<T>, body: Option<Body>) -> Result<T, FrankError> {
        self.execute(query, body, self.device.timeout())
            .await?
            .ok_or_else(|| FrankError::UnexpectedResponse(format!("{} returned no body", query.path)))
    }

    // -----------------------------------------------------------------------
    // Endpoint operations
    // -----------------------------------------------------------------------

    /// Applies `operation` to the views matched by `selector`.
    pub async fn map(&self, selector: &dyn Selector, operation: &Operation) -> Result<Response, FrankError> {
        let body = serde_json::to_value(MapRequest {
            query: selector.query(),
            operation,
            selector_engine: selector.engine(),
        })?;
        self.execute_parsed(&MAP, Some(Body::Json(body))).await
    }

    pub async fn type_into_keyboard(&self, text: &str) -> Result<(), FrankError> {
        let body = json!({ "text_to_type": text });
        self.execute(&TYPE_KEYBOARD, Some(Body::Json(body)), self.device.timeout())
            .await?;
        Ok(())
    }

    pub async fn accessibility_check(&self) -> Result<Accessibility, FrankError> {
        self.execute_parsed(&ACCESSIBILITY, None).await
    }

    pub async fn orientation(&self) -> Result<Orientation, FrankError> {
        self.execute_parsed(&ORIENTATION, None).await
    }

    pub async fn dump(&self) -> Result<Dump, FrankError> {
        self.execute_parsed(&DUMP, None).await
    }

    /// Invokes `name` on the application delegate. The agent receives the
    /// operation's display form as plain text.
    pub async fn app_exec(&self, name: &str, args: Vec<Value>) -> Result<Response, FrankError> {
        let operation = Operation::new(name, args);
        self.execute_parsed(&APP_EXEC, Some(Body::Text(operation.to_string())))
            .await
    }
}

impl fmt::Debug for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("device", &self.device.to_string())
            .field("complete", &self.is_complete())
            .finish()
    }
}
