//! Typed responses from the Frank agent.
//!
//! Every response body is JSON. The standard "frankly" envelope
//! (<http://testingwithfrank.com/frankly.html>) carries an `outcome` field that
//! is either `SUCCESS` or `FAILURE`; [`Response::parse`] uses it to choose
//! between [`Success`] and [`Failure`]. Bodies without an `outcome` field are
//! returned as [`Response::Other`].
//!
//! A body that decodes to something other than a JSON object (a bare string or
//! number, say) is wrapped as `{"outcome": <value>}` so its data stays
//! reachable through [`Payload::outcome`]. Such a response is never a
//! `Success` or `Failure`.
//!
//! The orientation, dump and accessibility endpoints answer with their own
//! shapes and have their own `parse` functions that skip the discriminant.
//!
//! # Example
//!
//! ```
//! use frank_core::response::Response;
//!
//! let response = Response::parse(r#"{"outcome":"SUCCESS","results":["ok"]}"#).unwrap();
//! match response {
//!     Response::Success(success) => assert_eq!(success.results().unwrap()[0], "ok"),
//!     other => panic!("unexpected: {other}"),
//! }
//! ```

use std::fmt;
use std::ops::{Deref, Index};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::element::ViewNode;
use crate::error::FrankError;

/// The `outcome` value marking a successful frankly response.
pub const OUTCOME_SUCCESS: &str = "SUCCESS";

static NULL: Value = Value::Null;

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// The decoded JSON object behind every response type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Wraps a decoded value, turning non-objects into `{"outcome": value}`.
    pub fn new(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            other => {
                let mut map = Map::new();
                map.insert("outcome".to_string(), other);
                Self(map)
            }
        }
    }

    fn decode(text: &str) -> Result<Self, FrankError> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    /// Returns the field named `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the field named `key`, or `default` if absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.0.get(key).unwrap_or(default)
    }

    /// The `outcome` field, if present.
    pub fn outcome(&self) -> Option<&Value> {
        self.get("outcome")
    }

    /// The underlying JSON object.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_raw(self) -> Map<String, Value> {
        self.0
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}

/// Key-style access; absent keys yield `Value::Null`.
impl Index<&str> for Payload {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&NULL)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

macro_rules! payload_wrapper {
    ($name:ident) => {
        impl Deref for $name {
            type Target = Payload;

            fn deref(&self) -> &Payload {
                &self.0
            }
        }

        impl From<Payload> for $name {
            fn from(payload: Payload) -> Self {
                Self(payload)
            }
        }

        impl $name {
            pub fn into_payload(self) -> Payload {
                self.0
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Success / Failure / Response
// ---------------------------------------------------------------------------

/// A frankly response whose `outcome` is `SUCCESS`.
#[derive(Debug, Clone, PartialEq)]
pub struct Success(Payload);

payload_wrapper!(Success);

impl Success {
    /// The `results` field: one entry per view the operation was applied to,
    /// or the return value of an app-exec call.
    pub fn results(&self) -> Option<&Value> {
        self.get("results")
    }
}

/// A frankly response whose `outcome` is anything other than `SUCCESS`.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure(Payload);

payload_wrapper!(Failure);

impl Failure {
    /// The `reason` field, exactly as the agent sent it.
    pub fn reason(&self) -> Option<&Value> {
        self.get("reason")
    }

    /// The `details` field, exactly as the agent sent it.
    pub fn details(&self) -> Option<&Value> {
        self.get("details")
    }
}

/// A response from `/map` or `/app_exec`.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Success(Success),
    Failure(Failure),
    /// A body without an `outcome` field, or one that was not a JSON object.
    Other(Payload),
}

impl Response {
    /// Decodes `text` and classifies it by its `outcome` field.
    pub fn parse(text: &str) -> Result<Self, FrankError> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        let is_object = value.is_object();
        let payload = Payload::new(value);
        if !is_object {
            return Self::Other(payload);
        }
        let succeeded = payload
            .outcome()
            .map(|outcome| outcome.as_str() == Some(OUTCOME_SUCCESS));
        match succeeded {
            Some(true) => Self::Success(Success(payload)),
            Some(false) => Self::Failure(Failure(payload)),
            None => Self::Other(payload),
        }
    }

    pub fn payload(&self) -> &Payload {
        match self {
            Self::Success(success) => &success.0,
            Self::Failure(failure) => &failure.0,
            Self::Other(payload) => payload,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn as_success(&self) -> Option<&Success> {
        match self {
            Self::Success(success) => Some(success),
            _ => None,
        }
    }

    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            Self::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "Success",
            Self::Failure(_) => "Failure",
            Self::Other(_) => "Response",
        }
    }
}

impl Deref for Response {
    type Target = Payload;

    fn deref(&self) -> &Payload {
        self.payload()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.payload())
    }
}

// ---------------------------------------------------------------------------
// Orientation
// ---------------------------------------------------------------------------

/// The physical orientation of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceOrientation {
    Portrait,
    Landscape,
}

impl DeviceOrientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => Orientation::PORTRAIT,
            Self::Landscape => Orientation::LANDSCAPE,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            Orientation::PORTRAIT => Some(Self::Portrait),
            Orientation::LANDSCAPE => Some(Self::Landscape),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response from `/orientation`.
#[derive(Debug, Clone, PartialEq)]
pub struct Orientation(Payload);

payload_wrapper!(Orientation);

impl Orientation {
    pub const PORTRAIT: &'static str = "portrait";
    pub const LANDSCAPE: &'static str = "landscape";

    pub fn parse(text: &str) -> Result<Self, FrankError> {
        Payload::decode(text).map(Self)
    }

    /// The reported orientation name, exactly as sent.
    pub fn name(&self) -> Option<&str> {
        self.get_str("orientation")
    }

    /// The reported orientation, if it is one of the two known values.
    pub fn orientation(&self) -> Option<DeviceOrientation> {
        self.name().and_then(DeviceOrientation::from_name)
    }
}

// ---------------------------------------------------------------------------
// Dump
// ---------------------------------------------------------------------------

/// Response from `/dump`: the application's entire UI tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Dump(Payload);

payload_wrapper!(Dump);

impl Dump {
    pub fn parse(text: &str) -> Result<Self, FrankError> {
        Payload::decode(text).map(Self)
    }

    /// Deserializes the tree into typed [`ViewNode`]s.
    pub fn tree(&self) -> Result<ViewNode, FrankError> {
        Ok(serde_json::from_value(Value::Object(self.0.raw().clone()))?)
    }
}

impl fmt::Display for Dump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ---------------------------------------------------------------------------
// Accessibility
// ---------------------------------------------------------------------------

/// Response from `/accessibility_check`.
#[derive(Debug, Clone, PartialEq)]
pub struct Accessibility(Payload);

payload_wrapper!(Accessibility);

impl Accessibility {
    pub fn parse(text: &str) -> Result<Self, FrankError> {
        Payload::decode(text).map(Self)
    }

    /// Whether accessibility is enabled in the app. Missing, `null`, `false`,
    /// zero, empty strings and empty containers all count as disabled.
    pub fn enabled(&self) -> bool {
        self.get("accessibility_enabled").is_some_and(truthy)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
