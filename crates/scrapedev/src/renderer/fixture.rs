//! In-memory renderer backed by static HTML fixtures.
//!
//! A [`FixtureSite`] maps URLs to pages whose content can grow in response to
//! interaction: a load-more button that appends batches on click, or an
//! infinite-scroll page that appends a batch per scroll. Documents are parsed
//! with the `scraper` crate on every query, so selectors behave the way they
//! would against real markup.
//!
//! All `scraper` types are `!Send`; they are confined to the synchronous
//! helpers at the bottom of this module and never held across an await.

use super::{ElementHandle, NavigationResult, RenderContext, Renderer};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How a fixture page reveals more content.
#[derive(Debug, Clone)]
pub enum Reveal {
    /// Content never changes.
    Static,
    /// A button with the given id appends the next batch per click. Once all
    /// batches are shown the button stays in the document, disabled.
    LoadMore {
        control_id: String,
        batches: Vec<String>,
    },
    /// Each scroll to the bottom appends the next batch.
    InfiniteScroll { batches: Vec<String> },
}

/// One URL-addressable fixture page.
#[derive(Debug, Clone)]
pub struct FixturePage {
    body: String,
    reveal: Reveal,
}

impl FixturePage {
    /// A page whose content never changes.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            reveal: Reveal::Static,
        }
    }

    /// A page with a load-more button.
    pub fn with_load_more(
        body: impl Into<String>,
        control_id: impl Into<String>,
        batches: Vec<String>,
    ) -> Self {
        Self {
            body: body.into(),
            reveal: Reveal::LoadMore {
                control_id: control_id.into(),
                batches,
            },
        }
    }

    /// A page that grows when scrolled to the bottom.
    pub fn with_infinite_scroll(body: impl Into<String>, batches: Vec<String>) -> Self {
        Self {
            body: body.into(),
            reveal: Reveal::InfiniteScroll { batches },
        }
    }
}

/// A set of fixture pages keyed by absolute URL.
#[derive(Debug, Clone, Default)]
pub struct FixtureSite {
    pages: HashMap<String, FixturePage>,
}

impl FixtureSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the page served at `url`.
    pub fn page(mut self, url: impl Into<String>, page: FixturePage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }
}

/// Counters recorded by fixture renderers and their contexts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureActivity {
    pub navigations: Vec<String>,
    pub clicks: usize,
    pub scrolls: usize,
    /// Element handles issued by `find_all` and `find_within`.
    pub handles_issued: usize,
    pub contexts_opened: usize,
    pub contexts_closed: usize,
    pub shutdowns: usize,
}

/// Shared, cloneable view of a fixture renderer's activity.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog(Arc<Mutex<FixtureActivity>>);

impl ActivityLog {
    /// Copy of the activity recorded so far.
    pub fn snapshot(&self) -> FixtureActivity {
        self.0.lock().map(|a| (*a).clone()).unwrap_or_default()
    }

    fn record(&self, f: impl FnOnce(&mut FixtureActivity)) {
        if let Ok(mut activity) = self.0.lock() {
            f(&mut activity);
        }
    }
}

/// Renderer serving a [`FixtureSite`].
pub struct FixtureRenderer {
    site: Arc<FixtureSite>,
    log: ActivityLog,
}

impl FixtureRenderer {
    pub fn new(site: FixtureSite) -> Self {
        Self {
            site: Arc::new(site),
            log: ActivityLog::default(),
        }
    }

    /// Handle for inspecting activity after the renderer has been consumed.
    pub fn activity(&self) -> ActivityLog {
        self.log.clone()
    }
}

#[async_trait]
impl Renderer for FixtureRenderer {
    async fn new_context(&mut self) -> Result<Box<dyn RenderContext>> {
        self.log.record(|a| a.contexts_opened += 1);
        Ok(Box::new(FixtureContext {
            site: Arc::clone(&self.site),
            log: self.log.clone(),
            current: None,
            handles: Vec::new(),
        }))
    }

    async fn shutdown(self: Box<Self>) -> Result<()> {
        self.log.record(|a| a.shutdowns += 1);
        Ok(())
    }
}

/// A loaded fixture page plus how much of it has been revealed.
struct LoadedPage {
    page: FixturePage,
    revealed: usize,
}

impl LoadedPage {
    fn remaining(&self) -> usize {
        match &self.page.reveal {
            Reveal::Static => 0,
            Reveal::LoadMore { batches, .. } | Reveal::InfiniteScroll { batches } => {
                batches.len().saturating_sub(self.revealed)
            }
        }
    }

    fn document(&self) -> String {
        let mut html = String::from("<html><body>");
        html.push_str(&self.page.body);
        match &self.page.reveal {
            Reveal::Static => {}
            Reveal::LoadMore {
                control_id,
                batches,
            } => {
                for batch in batches.iter().take(self.revealed) {
                    html.push_str(batch);
                }
                let disabled = if self.remaining() == 0 { " disabled" } else { "" };
                html.push_str(&format!(
                    r#"<button id="{control_id}"{disabled}>Load More</button>"#
                ));
            }
            Reveal::InfiniteScroll { batches } => {
                for batch in batches.iter().take(self.revealed) {
                    html.push_str(batch);
                }
            }
        }
        html.push_str("</body></html>");
        html
    }
}

/// A context over a [`FixtureSite`]. Element handles index `handles`, which
/// holds the outer HTML of every element handed out since the last navigation.
pub struct FixtureContext {
    site: Arc<FixtureSite>,
    log: ActivityLog,
    current: Option<LoadedPage>,
    handles: Vec<String>,
}

impl FixtureContext {
    fn loaded(&self) -> Result<&LoadedPage> {
        self.current.as_ref().context("no page loaded")
    }

    fn outer_html(&self, handle: ElementHandle) -> Result<&str> {
        self.handles
            .get(handle.0)
            .map(String::as_str)
            .with_context(|| format!("stale element handle {}", handle.0))
    }

    fn register(&mut self, found: Vec<String>) -> Vec<ElementHandle> {
        self.log.record(|a| a.handles_issued += found.len());
        let start = self.handles.len();
        self.handles.extend(found);
        (start..self.handles.len()).map(ElementHandle).collect()
    }
}

#[async_trait]
impl RenderContext for FixtureContext {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<NavigationResult> {
        self.log.record(|a| a.navigations.push(url.to_string()));
        let page = match self.site.pages.get(url) {
            Some(page) => page.clone(),
            None => bail!("navigation to {url} failed: no fixture page"),
        };
        self.handles.clear();
        self.current = Some(LoadedPage { page, revealed: 0 });
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 0,
        })
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>> {
        let document = self.loaded()?.document();
        let found = select_in_document(&document, selector)?;
        Ok(self.register(found))
    }

    async fn find_within(
        &mut self,
        parent: ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>> {
        let found = select_in_fragment(self.outer_html(parent)?, selector)?;
        Ok(self.register(found))
    }

    async fn count(&mut self, selector: &str) -> Result<usize> {
        let document = self.loaded()?.document();
        Ok(select_in_document(&document, selector)?.len())
    }

    async fn is_actionable(&mut self, selector: &str) -> Result<bool> {
        let document = self.loaded()?.document();
        let Some(html) = select_in_document(&document, selector)?.into_iter().next() else {
            return Ok(false);
        };
        let disabled = attribute_of(&html, "disabled")?.is_some();
        let hidden = attribute_of(&html, "hidden")?.is_some();
        Ok(!disabled && !hidden)
    }

    async fn click(&mut self, element: ElementHandle) -> Result<()> {
        self.log.record(|a| a.clicks += 1);
        let html = self.outer_html(element)?;
        let id = attribute_of(html, "id")?;
        let disabled = attribute_of(html, "disabled")?.is_some();

        let page = self.current.as_mut().context("no page loaded")?;
        let is_control = matches!(
            (&page.page.reveal, id.as_deref()),
            (Reveal::LoadMore { control_id, .. }, Some(id)) if control_id == id
        );
        if is_control && !disabled && page.remaining() > 0 {
            page.revealed += 1;
        }
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.log.record(|a| a.scrolls += 1);
        let page = self.current.as_mut().context("no page loaded")?;
        if matches!(page.page.reveal, Reveal::InfiniteScroll { .. }) && page.remaining() > 0 {
            page.revealed += 1;
        }
        Ok(())
    }

    async fn document_height(&mut self) -> Result<u64> {
        Ok(self.loaded()?.document().len() as u64)
    }

    async fn read_text(&mut self, element: ElementHandle) -> Result<String> {
        text_of(self.outer_html(element)?)
    }

    async fn read_attribute(
        &mut self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>> {
        attribute_of(self.outer_html(element)?, name)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.log.record(|a| a.contexts_closed += 1);
        Ok(())
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow::anyhow!("invalid selector `{selector}`: {e}"))
}

fn select_in_document(html: &str, selector: &str) -> Result<Vec<String>> {
    let sel = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document.select(&sel).map(|el| el.html()).collect())
}

/// First element of a parsed fragment (the fragment root is a synthetic `<html>`).
fn fragment_element(fragment: &Html) -> Result<ElementRef<'_>> {
    fragment
        .root_element()
        .children()
        .find_map(ElementRef::wrap)
        .context("element fragment is empty")
}

fn select_in_fragment(outer_html: &str, selector: &str) -> Result<Vec<String>> {
    let sel = parse_selector(selector)?;
    let fragment = Html::parse_fragment(outer_html);
    let root = fragment_element(&fragment)?;
    Ok(root
        .select(&sel)
        .filter(|el| el.id() != root.id())
        .map(|el| el.html())
        .collect())
}

fn text_of(outer_html: &str) -> Result<String> {
    let fragment = Html::parse_fragment(outer_html);
    Ok(fragment_element(&fragment)?.text().collect())
}

fn attribute_of(outer_html: &str, name: &str) -> Result<Option<String>> {
    let fragment = Html::parse_fragment(outer_html);
    Ok(fragment_element(&fragment)?
        .value()
        .attr(name)
        .map(str::to_string))
}
