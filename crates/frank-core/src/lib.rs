//! # frank-core
//!
//! Client library for driving a [Frank](http://testingwithfrank.com) agent
//! embedded in an iOS application, over HTTP.
//!
//! The agent exposes a handful of endpoints; this crate builds the requests,
//! sends them and turns the JSON answers into typed values.
//!
//! ## Modules
//!
//! - [`device`] - Entry point holding the agent's host and port
//! - [`view`] - Proxies that send messages to the views matched by a selector
//! - [`selector`] - The `uiquery` selector builder
//! - [`operation`] - Method invocations sent to views or the app delegate
//! - [`request`] - Endpoint descriptors and HTTP dispatch
//! - [`response`] - Typed responses (`Success`, `Failure`, orientation, dump, ...)
//! - [`element`] - Typed UI tree returned by `/dump`
//! - [`config`] - Persistent defaults in `~/.frank/config.json`
//! - [`error`] - The [`FrankError`](error::FrankError) type
//!
//! ## Example
//!
//! ```no_run
//! use frank_core::device::Device;
//! use frank_core::response::Response;
//! use frank_core::selector::UiQuery;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), frank_core::error::FrankError> {
//! let device = Device::new("127.0.0.1", 37265);
//!
//! let login = device.view(UiQuery::from_values([json!("button"), json!({"marked": "Login"})])?);
//! match login.touch().await? {
//!     Response::Success(success) => println!("touched {:?}", success.results()),
//!     Response::Failure(failure) => eprintln!("touch failed: {:?}", failure.reason()),
//!     Response::Other(payload) => eprintln!("unexpected answer: {payload}"),
//! }
//!
//! device.type_into_keyboard("secret").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod element;
pub mod error;
pub mod operation;
pub mod request;
pub mod response;
pub mod selector;
pub mod view;

pub use device::Device;
pub use error::FrankError;
pub use response::Response;
pub use selector::{Selector, UiQuery};
pub use view::View;

#[doc(hidden)]
pub mod __private {
    pub use serde_json::json;
}
