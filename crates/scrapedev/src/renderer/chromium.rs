//! Chromium-based renderer using chromiumoxide.

use super::{ElementHandle, NavigationResult, RenderContext, Renderer};
use crate::config::BrowserSettings;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Environment variable that points at a Chromium binary.
pub const CHROMIUM_PATH_ENV: &str = "SCRAPEDEV_CHROMIUM_PATH";

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. SCRAPEDEV_CHROMIUM_PATH env
    if let Ok(p) = std::env::var(CHROMIUM_PATH_ENV) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer. Owns the browser process.
pub struct ChromiumRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// Launch a Chromium instance with the given settings.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let chrome_path = match &settings.chromium_path {
            Some(path) => path.clone(),
            None => find_chromium().with_context(|| {
                format!("Chromium not found. Install Chrome or set {CHROMIUM_PATH_ENV}.")
            })?,
        };

        let builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(settings.window_width, settings.window_height)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");
        let builder = if settings.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // The CDP connection only makes progress while its handler is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("chromium handler event error: {e}");
                }
            }
        });

        tracing::debug!(headless = settings.headless, "launched Chromium");

        Ok(Self { browser, handler })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&mut self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        Ok(Box::new(ChromiumContext {
            page,
            elements: Vec::new(),
        }))
    }

    async fn shutdown(self: Box<Self>) -> Result<()> {
        let mut this = *self;
        let closed = this.browser.close().await.context("failed to close Chromium");
        let _ = this.browser.wait().await;
        this.handler.abort();
        tracing::debug!("Chromium shut down");
        closed.map(|_| ())
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
    /// Elements handed out since the last navigation, indexed by handle.
    elements: Vec<Element>,
}

impl ChromiumContext {
    fn register(&mut self, found: Vec<Element>) -> Vec<ElementHandle> {
        let start = self.elements.len();
        self.elements.extend(found);
        (start..self.elements.len()).map(ElementHandle).collect()
    }

    fn element(&self, handle: ElementHandle) -> Result<&Element> {
        self.elements
            .get(handle.0)
            .with_context(|| format!("stale element handle {}", handle.0))
    }

    async fn evaluate<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T> {
        self.page
            .evaluate(script)
            .await?
            .into_value()
            .map_err(|e| anyhow::anyhow!("unexpected script result: {e:?}"))
    }

    async fn call_on(&self, handle: ElementHandle, function: &str) -> Result<serde_json::Value> {
        let ret = self
            .element(handle)?
            .call_js_fn(function, false)
            .await
            .context("JS call on element failed")?;
        Ok(ret.result.value.unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<NavigationResult> {
        let start = Instant::now();
        self.elements.clear();

        let page = &self.page;
        let load = async move {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };

        match tokio::time::timeout(timeout, load).await {
            Ok(Ok(())) => {
                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms: start.elapsed().as_millis() as u64,
                })
            }
            Ok(Err(e)) => bail!("navigation to {url} failed: {e}"),
            Err(_) => bail!("navigation to {url} timed out after {}ms", timeout.as_millis()),
        }
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>> {
        let found = self
            .page
            .find_elements(selector)
            .await
            .with_context(|| format!("query `{selector}` failed"))?;
        Ok(self.register(found))
    }

    async fn find_within(
        &mut self,
        parent: ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>> {
        let found = self
            .element(parent)?
            .find_elements(selector)
            .await
            .with_context(|| format!("query `{selector}` inside element failed"))?;
        Ok(self.register(found))
    }

    async fn count(&mut self, selector: &str) -> Result<usize> {
        let script = format!(
            "document.querySelectorAll({}).length",
            serde_json::to_string(selector)?
        );
        self.evaluate(&script)
            .await
            .with_context(|| format!("count of `{selector}` failed"))
    }

    async fn is_actionable(&mut self, selector: &str) -> Result<bool> {
        let script = format!(
            "(() => {{ \
                const el = document.querySelector({}); \
                if (!el) return false; \
                const style = window.getComputedStyle(el); \
                return !el.disabled \
                    && style.visibility !== 'hidden' \
                    && el.getClientRects().length > 0; \
            }})()",
            serde_json::to_string(selector)?
        );
        self.evaluate(&script)
            .await
            .with_context(|| format!("actionable check of `{selector}` failed"))
    }

    async fn click(&mut self, element: ElementHandle) -> Result<()> {
        // Script click so overlays and sticky headers cannot intercept it.
        self.call_on(element, "function() { this.click(); }").await?;
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .context("scroll failed")?;
        Ok(())
    }

    async fn document_height(&mut self) -> Result<u64> {
        self.evaluate("document.body.scrollHeight")
            .await
            .context("failed to measure document height")
    }

    async fn read_text(&mut self, element: ElementHandle) -> Result<String> {
        let text = self
            .element(element)?
            .inner_text()
            .await
            .context("failed to read element text")?;
        Ok(text.unwrap_or_default())
    }

    async fn read_attribute(
        &mut self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>> {
        self.element(element)?
            .attribute(name)
            .await
            .with_context(|| format!("failed to read attribute `{name}`"))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.page.close().await.context("failed to close page")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_find_click_and_read() {
        let mut renderer = Box::new(
            ChromiumRenderer::launch(&BrowserSettings::default())
                .await
                .expect("failed to launch renderer"),
        );
        let mut ctx = renderer
            .new_context()
            .await
            .expect("failed to create context");

        ctx.navigate(
            "data:text/html,<div class='card' data-user='ada'><p> Hello </p></div>\
             <button onclick=\"document.body.insertAdjacentHTML('beforeend', \
             '<div class=card><p>More</p></div>')\">more</button>",
            Duration::from_secs(10),
        )
        .await
        .expect("navigation failed");

        let cards = ctx.find_all(".card").await.expect("query failed");
        assert_eq!(cards.len(), 1);

        let text = ctx.read_text(cards[0]).await.expect("read failed");
        assert_eq!(text.trim(), "Hello");
        let user = ctx
            .read_attribute(cards[0], "data-user")
            .await
            .expect("attribute failed");
        assert_eq!(user.as_deref(), Some("ada"));

        assert!(ctx.is_actionable("button").await.expect("check failed"));
        assert!(!ctx.is_actionable("#absent").await.expect("check failed"));
        let button = ctx.find_all("button").await.expect("query failed")[0];
        ctx.click(button).await.expect("click failed");
        assert_eq!(ctx.count(".card").await.expect("count failed"), 2);

        assert!(ctx.document_height().await.expect("height failed") > 0);

        ctx.close().await.expect("close failed");
        renderer.shutdown().await.expect("shutdown failed");
    }
}
