//! View proxies: send arbitrary messages to the views matched by a selector.
//!
//! Frank can call any Objective-C method on the matched views, so a [`View`]
//! does not enumerate them. [`View::invoke`] is the single dynamic entry point;
//! the [`frank_call!`](crate::frank_call) macro gives it method-call syntax.
//!
//! # Example
//!
//! ```no_run
//! use frank_core::device::Device;
//! use frank_core::frank_call;
//! use frank_core::selector::UiQuery;
//!
//! # async fn example() -> Result<(), frank_core::error::FrankError> {
//! let device = Device::new("127.0.0.1", 37265);
//! let view = device.view(UiQuery::new(["tabBarButton"]));
//!
//! view.flash().await?;
//! frank_call!(view.touch()).await?;
//! view.invoke("setText:", vec!["hello".into()]).await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::instrument;

use crate::device::Device;
use crate::error::FrankError;
use crate::operation::Operation;
use crate::response::Response;
use crate::selector::Selector;

/// Method names starting with this prefix are never forwarded to the agent.
pub const RESERVED_PREFIX: char = '_';

/// The views matched by a selector on a particular device.
#[derive(Debug, Clone)]
pub struct View {
    selector: Arc<dyn Selector>,
    device: Device,
}

impl View {
    pub fn new(selector: Arc<dyn Selector>, device: Device) -> Self {
        Self { selector, device }
    }

    pub fn selector(&self) -> &dyn Selector {
        self.selector.as_ref()
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Sends `method` with `args` to every matched view via `/map`.
    ///
    /// The name is forwarded as is, so private selectors such as `_setText:`
    /// can be sent deliberately.
    #[instrument(skip(self, args), fields(query = %self.selector.query()))]
    pub async fn send_message(&self, method: &str, args: Vec<Value>) -> Result<Response, FrankError> {
        let operation = Operation::new(method, args);
        self.device.request().map(self.selector(), &operation).await
    }

    /// Dynamic dispatch entry point used by [`frank_call!`](crate::frank_call).
    ///
    /// Empty method names and names starting with [`RESERVED_PREFIX`] are
    /// rejected with [`FrankError::Argument`] without contacting the agent.
    /// Use [`send_message`](Self::send_message) to reach such selectors.
    pub async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Response, FrankError> {
        if method.is_empty() || method.starts_with(RESERVED_PREFIX) {
            return Err(FrankError::Argument(format!("not a remote method name: {method:?}")));
        }
        self.send_message(method, args).await
    }

    pub async fn touch(&self) -> Result<Response, FrankError> {
        self.send_message("touch", Vec::new()).await
    }

    /// Briefly highlights the matched views on screen.
    pub async fn flash(&self) -> Result<Response, FrankError> {
        self.send_message("flash", Vec::new()).await
    }

    pub async fn set_text(&self, text: &str) -> Result<Response, FrankError> {
        self.send_message("setText:", vec![Value::from(text)]).await
    }

    pub async fn accessibility_label(&self) -> Result<Response, FrankError> {
        self.send_message("accessibilityLabel", Vec::new()).await
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "View(Selector({}, {}), {})",
            self.selector.engine(),
            self.selector.query(),
            self.device
        )
    }
}

/// Calls a remote method on a [`View`] with method-call syntax.
///
/// `frank_call!(view.touch("x"))` expands to
/// `view.invoke("touch", vec![json!("x")])` and returns its future. The
/// receiver can be any place expression: `frank_call!(self.view.flash())`,
/// `frank_call!(views[0].touch())`.
#[macro_export]
macro_rules! frank_call {
    (@recv [$($recv:tt)+] . $method:ident ( $($arg:expr),* $(,)? )) => {
        $($recv)+ .invoke(
            ::core::stringify!($method),
            ::std::vec![$($crate::__private::json!($arg)),*],
        )
    };
    (@recv [$($recv:tt)+] $next:tt $($rest:tt)*) => {
        $crate::frank_call!(@recv [$($recv)+ $next] $($rest)*)
    };
    ($first:tt $($rest:tt)*) => {
        $crate::frank_call!(@recv [$first] $($rest)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::UiQuery;

    fn view() -> View {
        Device::new("127.0.0.1", 37265).view(UiQuery::new(["button"]))
    }

    #[tokio::test]
    async fn reserved_names_are_rejected_by_invoke() {
        let view = view();
        for name in ["_private", ""] {
            let result = view.invoke(name, Vec::new()).await;
            assert!(matches!(result, Err(FrankError::Argument(_))), "{name:?} should be rejected");
        }
    }

    struct Screen {
        views: Vec<View>,
    }

    impl Screen {
        async fn reserved_through_field(&self) -> Result<Response, FrankError> {
            frank_call!(self.views[0]._hidden()).await
        }
    }

    #[tokio::test]
    async fn macro_accepts_field_and_index_receivers() {
        let screen = Screen { views: vec![view()] };
        let views = &screen.views;
        assert!(matches!(
            frank_call!(views[0]._hidden(1, "two")).await,
            Err(FrankError::Argument(_))
        ));
        assert!(matches!(screen.reserved_through_field().await, Err(FrankError::Argument(_))));
    }

    #[test]
    fn display_shows_selector_and_device() {
        assert_eq!(
            view().to_string(),
            "View(Selector(uiquery, button), Device('127.0.0.1',37265,'iPhone'))"
        );
    }

    #[test]
    fn accessors_expose_binding() {
        let view = view();
        assert_eq!(view.selector().query(), "button");
        assert_eq!(view.device().port(), 37265);
    }
}
