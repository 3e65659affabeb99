//! Renderer abstraction for browser-driven collection.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over the
//! browser engine. The collector only talks to these traits, so the same
//! collection logic runs against headless Chromium (via chromiumoxide) or
//! against the in-memory [`fixture`] site used in tests.

pub mod chromium;
pub mod fixture;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// Opaque reference to an element in the current document.
///
/// Handles are only meaningful to the context that issued them and become
/// stale after the next navigation. Contexts keep every issued handle alive
/// until then, so polling code should prefer [`RenderContext::count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub(crate) usize);

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send {
    /// Create a new browser context (tab).
    async fn new_context(&mut self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine and release its process.
    async fn shutdown(self: Box<Self>) -> Result<()>;
}

/// A single browser context (tab) the collector drives.
#[async_trait]
pub trait RenderContext: Send {
    /// Navigate to a URL, failing if the load does not finish within `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<NavigationResult>;
    /// All elements in the document matching a CSS selector, in document order.
    async fn find_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>>;
    /// Descendants of `parent` matching a CSS selector, in document order.
    async fn find_within(
        &mut self,
        parent: ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>>;
    /// Number of elements matching a CSS selector. Issues no handles.
    async fn count(&mut self, selector: &str) -> Result<usize>;
    /// Whether the first element matching a CSS selector is visible and
    /// enabled. `false` when nothing matches. Issues no handles.
    async fn is_actionable(&mut self, selector: &str) -> Result<bool>;
    /// Activate the element.
    async fn click(&mut self, element: ElementHandle) -> Result<()>;
    /// Scroll the viewport to the bottom edge of the document.
    async fn scroll_to_bottom(&mut self) -> Result<()>;
    /// Current total extent of the document.
    async fn document_height(&mut self) -> Result<u64>;
    /// Rendered text of the element, untrimmed.
    async fn read_text(&mut self, element: ElementHandle) -> Result<String>;
    /// Value of an attribute on the element.
    async fn read_attribute(&mut self, element: ElementHandle, name: &str)
        -> Result<Option<String>>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}
