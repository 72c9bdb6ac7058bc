//! Driver - abstract browser capability.
//!
//! Scenarios and helpers only talk to [`Driver`]. Two implementations exist:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Driver (trait)                                              │
//! ├──────────────────────────────┬───────────────────────────────┤
//! │  ChromiumDriver              │  StubDriver                   │
//! │  (feature = "browser")       │  (always available)           │
//! │  CDP via chromiumoxide       │  in-memory inventory app      │
//! └──────────────────────────────┴───────────────────────────────┘
//! ```
//!
//! Lookups are immediate: `find_all` returns what is rendered right now. Waiting
//! for elements is the caller's job (see [`crate::wait`]).

use crate::locator::Locator;
use crate::result::{RegressionError, RegressionResult};
use async_trait::async_trait;
use std::fmt;

/// Opaque handle to a rendered element
///
/// Valid until the next navigation; using it afterwards is an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef {
    id: u64,
    locator: Locator,
}

impl ElementRef {
    /// Create a handle (driver implementations only)
    #[must_use]
    pub const fn new(id: u64, locator: Locator) -> Self {
        Self { id, locator }
    }

    /// Driver-assigned identifier
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Locator that produced this handle
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.locator, self.id)
    }
}

/// Browser automation capability used by the suite
#[async_trait]
pub trait Driver: Send + Sync {
    /// Load `url` and wait for the page load to finish
    async fn navigate(&self, url: &str) -> RegressionResult<()>;

    /// Every element currently matching `locator`, optionally under `scope`
    async fn find_all(
        &self,
        scope: Option<&ElementRef>,
        locator: &Locator,
    ) -> RegressionResult<Vec<ElementRef>>;

    /// Rendered text of an element
    async fn text(&self, element: &ElementRef) -> RegressionResult<String>;

    /// Attribute value, `None` when absent
    async fn attribute(&self, element: &ElementRef, name: &str) -> RegressionResult<Option<String>>;

    /// Whether the element is rendered visibly
    async fn is_displayed(&self, element: &ElementRef) -> RegressionResult<bool>;

    /// Clear an input's value
    async fn clear(&self, element: &ElementRef) -> RegressionResult<()>;

    /// Type text into an input
    async fn send_keys(&self, element: &ElementRef, text: &str) -> RegressionResult<()>;

    /// Scroll so the element sits in the vertical centre of the viewport
    async fn scroll_into_view_center(&self, element: &ElementRef) -> RegressionResult<()>;

    /// Pointer click at the element's centre
    ///
    /// Fails with [`RegressionError::ClickIntercepted`] when another element
    /// occupies the click point. Never falls back on its own.
    async fn native_click(&self, element: &ElementRef) -> RegressionResult<()>;

    /// Invoke the element's click behaviour from page script, bypassing hit-testing
    async fn script_click(&self, element: &ElementRef) -> RegressionResult<()>;

    /// Accept the open browser dialog
    ///
    /// Fails with [`RegressionError::DialogAbsent`] when none is open.
    async fn accept_dialog(&self) -> RegressionResult<()>;

    /// PNG of the current viewport
    async fn screenshot_png(&self) -> RegressionResult<Vec<u8>>;

    /// Release the browser
    async fn close(&self) -> RegressionResult<()>;

    /// Whether the element's class list contains `class`
    async fn has_class(&self, element: &ElementRef, class: &str) -> RegressionResult<bool> {
        Ok(self
            .attribute(element, "class")
            .await?
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class)))
    }

    /// First element matching `locator`, without waiting
    async fn find_first(
        &self,
        scope: Option<&ElementRef>,
        locator: &Locator,
    ) -> RegressionResult<ElementRef> {
        self.find_all(scope, locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RegressionError::not_found(locator.to_string()))
    }
}
