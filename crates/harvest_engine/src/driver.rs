//! Capability interface over the remote, lazily rendered UI.
//!
//! The engine never sees markup. It asks the driver for opaque element handles
//! matching a [`Locator`], reads attributes and visible text through them, and
//! moves the UI with scroll and click calls. Every call is immediate; bounded waits
//! are layered on top in [`crate::wait`].

use std::fmt;

use thiserror::Error;

/// Opaque reference to an element rendered by the remote UI.
///
/// A handle may go stale as soon as the remote side re-renders; drivers report
/// that with [`DriverError::Stale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(u64);

impl ElementHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Predicate selecting descendants of a scope element (or of the whole document).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Structural/attribute predicate in CSS selector syntax.
    Css(String),
    /// Elements matching `selector` whose visible text contains `fragment`, keeping
    /// only the innermost of nested matches.
    Text { selector: String, fragment: String },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    /// Any element containing `fragment`.
    pub fn text(fragment: impl Into<String>) -> Self {
        Self::text_in("*", fragment)
    }

    pub fn text_in(selector: impl Into<String>, fragment: impl Into<String>) -> Self {
        Locator::Text {
            selector: selector.into(),
            fragment: fragment.into(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css `{selector}`"),
            Locator::Text { selector, fragment } => {
                write!(f, "text `{fragment}` in css `{selector}`")
            }
        }
    }
}

/// Scroll geometry of a scrollable element, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Distance the viewport can travel inside the scrollable region.
    pub fn scrollable_range(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("nothing matched {locator} within {waited_ms} ms")]
    NotFound { locator: String, waited_ms: u128 },
    #[error("element handle {0} is no longer attached")]
    Stale(u64),
    #[error("driver protocol error: {0}")]
    Protocol(String),
}

impl DriverError {
    pub fn is_stale(&self) -> bool {
        matches!(self, DriverError::Stale(_))
    }
}

/// Operations the engine needs from the remote UI. Implementations must not block
/// waiting for content; the engine does its own bounded polling.
#[async_trait::async_trait]
pub trait UiDriver: Send + Sync {
    /// All current matches of `locator` below `scope` (or the document when `None`),
    /// in document order. An empty result is not an error.
    async fn find_all(
        &self,
        scope: Option<ElementHandle>,
        locator: &Locator,
    ) -> Result<Vec<ElementHandle>, DriverError>;

    async fn attribute(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Rendered, user-visible text of the element.
    async fn text(&self, element: ElementHandle) -> Result<String, DriverError>;

    async fn scroll_metrics(&self, element: ElementHandle) -> Result<ScrollMetrics, DriverError>;

    async fn set_scroll_top(&self, element: ElementHandle, top: f64) -> Result<(), DriverError>;

    async fn scroll_into_view(&self, element: ElementHandle) -> Result<(), DriverError>;

    async fn click(&self, element: ElementHandle) -> Result<(), DriverError>;
}
