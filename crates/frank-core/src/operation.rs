//! Method invocations sent to the agent.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// A method name plus positional arguments, applied either to the views
/// matched by a selector (`/map`) or to the application delegate (`/app_exec`).
///
/// Serializes as `{"method_name": ..., "arguments": [...]}`. The [`Display`]
/// form, `Operation(name, [args])`, is what `/app_exec` receives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    method_name: String,
    arguments: Vec<Value>,
}

impl Operation {
    pub fn new(method_name: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            method_name: method_name.into(),
            arguments,
        }
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arguments = serde_json::to_string(&self.arguments).map_err(|_| fmt::Error)?;
        write!(f, "Operation({}, {arguments})", self.method_name)
    }
}
