//! Selectors for locating views inside the app under test.
//!
//! A [`Selector`] produces the query text and the name of the selector engine
//! that the Frank agent should use to evaluate it. [`UiQuery`] is the only
//! engine implemented here; its syntax is documented at
//! <http://testingwithfrank.com/selector_syntax.html>.
//!
//! The query is assembled from [`Term`]s and is *not* validated against the
//! engine grammar: a malformed query is reported by the agent as a
//! [`Failure`](crate::response::Failure).
//!
//! # Example
//!
//! ```
//! use frank_core::selector::{Selector, Term, UiQuery};
//! use serde_json::json;
//!
//! // All three describe the same views.
//! let a = UiQuery::new([Term::from(("view", "UIImageView")), Term::from(("marked", "ProfilePicture"))]);
//! let b = UiQuery::from_values([json!({"view": "UIImageView"}), json!({"marked": "ProfilePicture"})]).unwrap();
//! let c = UiQuery::new(["view:\"UIImageView\" marked:\"ProfilePicture\""]);
//!
//! assert_eq!(a.query(), b.query());
//! assert_eq!(a.query(), c.query());
//! ```

use std::fmt;

use serde_json::{Map, Value};

use crate::error::FrankError;

/// Name of the UIQuery selector engine, as understood by the agent.
pub const UIQUERY_ENGINE: &str = "uiquery";

/// A query that locates zero or more views.
pub trait Selector: fmt::Debug + Send + Sync {
    /// The selector engine the agent should evaluate [`query`](Self::query) with.
    fn engine(&self) -> &str;

    /// The serialized query text.
    fn query(&self) -> String;
}

/// One building block of a [`UiQuery`].
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Query text passed through unchanged, e.g. `button` or `marked:'Done'`.
    Raw(String),
    /// A single `key:value` clause; the value is JSON-encoded.
    Pair(String, Value),
    /// One `key:value` clause per entry, in insertion order.
    Map(Map<String, Value>),
}

impl Term {
    fn push_clauses(self, clauses: &mut Vec<String>) {
        match self {
            Term::Raw(text) => clauses.push(text),
            Term::Pair(key, value) => clauses.push(clause(&key, &value)),
            Term::Map(entries) => {
                clauses.extend(entries.iter().map(|(key, value)| clause(key, value)));
            }
        }
    }
}

fn clause(key: &str, value: &Value) -> String {
    format!("{key}:{value}")
}

impl From<&str> for Term {
    fn from(text: &str) -> Self {
        Term::Raw(text.to_string())
    }
}

impl From<String> for Term {
    fn from(text: String) -> Self {
        Term::Raw(text)
    }
}

impl<K: Into<String>, V: Into<Value>> From<(K, V)> for Term {
    fn from((key, value): (K, V)) -> Self {
        Term::Pair(key.into(), value.into())
    }
}

impl From<Map<String, Value>> for Term {
    fn from(entries: Map<String, Value>) -> Self {
        Term::Map(entries)
    }
}

impl TryFrom<Value> for Term {
    type Error = FrankError;

    /// Interprets a dynamically-typed term: strings are raw text, objects are
    /// maps and two-element arrays are `[key, value]` pairs.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) => Ok(Term::Raw(text)),
            Value::Object(entries) => Ok(Term::Map(entries)),
            Value::Array(items) if items.len() == 2 => {
                let [key, value] = <[Value; 2]>::try_from(items).map_err(|items| {
                    FrankError::Argument(format!("expected a [key, value] pair, got {items:?}"))
                })?;
                let key = match key {
                    Value::String(key) => key,
                    other => other.to_string(),
                };
                Ok(Term::Pair(key, value))
            }
            other => Err(FrankError::Argument(format!(
                "unknown type passed to UiQuery: {} ({other})",
                type_name(&other)
            ))),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The `uiquery` selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UiQuery {
    clauses: Vec<String>,
}

impl UiQuery {
    /// Builds a query from typed terms. Clause order follows term order.
    pub fn new<I, T>(terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Term>,
    {
        let mut clauses = Vec::new();
        for term in terms {
            term.into().push_clauses(&mut clauses);
        }
        Self { clauses }
    }

    /// Builds a query from JSON values (strings, objects or `[key, value]`
    /// arrays). Any other value is rejected with [`FrankError::Argument`].
    pub fn from_values<I>(values: I) -> Result<Self, FrankError>
    where
        I: IntoIterator<Item = Value>,
    {
        let terms = values
            .into_iter()
            .map(Term::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(terms))
    }

    /// The individual clauses, before joining.
    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }
}

impl Selector for UiQuery {
    fn engine(&self) -> &str {
        UIQUERY_ENGINE
    }

    fn query(&self) -> String {
        self.clauses.join(" ")
    }
}

impl fmt::Display for UiQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UiQuery({}, {})", self.engine(), self.query())
    }
}
