//! Error type shared by every Frank client operation.
//!
//! Transport failures are classified once, at the request boundary, into the
//! variants below. Failures reported by the agent itself (an `outcome` other
//! than `SUCCESS`) are not errors: they arrive as
//! [`Response::Failure`](crate::response::Response::Failure) values.

use thiserror::Error;

/// Errors that can occur while talking to a Frank agent.
#[derive(Error, Debug)]
pub enum FrankError {
    /// An invalid argument was passed to a client API (e.g., an unsupported
    /// selector term or a reserved method name).
    #[error("invalid argument: {0}")]
    Argument(String),

    /// The request did not complete within its timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// The URL that was being requested.
        url: String,
    },

    /// The agent could not be reached (refused, reset, DNS failure, ...).
    #[error("connection to {url} failed: {message}")]
    Connection {
        /// The URL that was being requested.
        url: String,
        /// Transport-level description of the failure.
        message: String,
    },

    /// The agent answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Http {
        /// The URL that was being requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The agent answered without a readable body where one was expected.
    #[error("empty response from {url}")]
    EmptyResponse {
        /// The URL that was being requested.
        url: String,
    },

    /// A request body could not be encoded or a response body was not JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response was valid JSON but not in the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FrankError {
    /// Classifies a `reqwest` error raised while requesting `url`.
    ///
    /// Status codes never reach this point: the request pipeline checks them
    /// on the response and reports [`FrankError::Http`] itself.
    pub(crate) fn from_transport(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout {
                url: url.to_string(),
            };
        }
        Self::Connection {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    /// Returns `true` if the error originated in the HTTP transport rather
    /// than in argument validation or response decoding.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Connection { .. } | Self::Http { .. } | Self::EmptyResponse { .. }
        )
    }
}
