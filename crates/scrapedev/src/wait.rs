//! Bounded condition waits over the current document.
//!
//! Instead of sleeping a fixed interval after each interaction, the collector
//! states what it expects to see (a control becoming clickable, more cards
//! appearing, the document growing) and polls for it under a deadline. A
//! timeout is reported as [`WaitOutcome::TimedOut`], never as an error; the
//! caller decides whether that means "stop" or "carry on".

use std::time::Duration;

use anyhow::Result;
use tokio::time::Instant;

use crate::renderer::RenderContext;

/// Deadline and polling cadence for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSpec {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitSpec {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }
}

/// A predicate over the current document.
#[derive(Debug, Clone, Copy)]
pub enum Condition<'a> {
    /// At least one element matches the selector.
    Present(&'a str),
    /// The first element matching the selector is visible and enabled.
    Actionable(&'a str),
    /// More than the given number of elements match the selector.
    CountAbove(&'a str, usize),
    /// The document height differs from the baseline.
    HeightChanged(u64),
}

impl Condition<'_> {
    /// Evaluate the condition once against the current document.
    pub async fn holds(&self, ctx: &mut dyn RenderContext) -> Result<bool> {
        match *self {
            Condition::Present(selector) => Ok(ctx.count(selector).await? > 0),
            Condition::Actionable(selector) => ctx.is_actionable(selector).await,
            Condition::CountAbove(selector, count) => Ok(ctx.count(selector).await? > count),
            Condition::HeightChanged(baseline) => Ok(ctx.document_height().await? != baseline),
        }
    }
}

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Satisfied { elapsed: Duration },
    TimedOut { elapsed: Duration },
}

impl WaitOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, WaitOutcome::Satisfied { .. })
    }
}

/// Poll `condition` until it holds or `timing.timeout` elapses.
///
/// The condition is always checked at least once, even with a zero timeout.
/// Errors from the renderer are propagated immediately.
pub async fn wait_for(
    ctx: &mut dyn RenderContext,
    condition: Condition<'_>,
    timing: WaitSpec,
) -> Result<WaitOutcome> {
    let start = Instant::now();
    let deadline = start + timing.timeout;

    loop {
        if condition.holds(ctx).await? {
            let elapsed = start.elapsed();
            tracing::trace!(?condition, ?elapsed, "condition satisfied");
            return Ok(WaitOutcome::Satisfied { elapsed });
        }

        let now = Instant::now();
        if now >= deadline {
            let elapsed = now - start;
            tracing::debug!(?condition, ?elapsed, "condition wait timed out");
            return Ok(WaitOutcome::TimedOut { elapsed });
        }

        tokio::time::sleep(timing.poll_interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fixture::{FixturePage, FixtureRenderer, FixtureSite};
    use crate::renderer::Renderer;

    const URL: &str = "https://fixture.test/";

    fn timing(timeout_ms: u64) -> WaitSpec {
        WaitSpec::new(Duration::from_millis(timeout_ms), Duration::from_millis(5))
    }

    async fn loaded(page: FixturePage) -> Box<dyn RenderContext> {
        let mut renderer = FixtureRenderer::new(FixtureSite::new().page(URL, page));
        let mut ctx = renderer.new_context().await.unwrap();
        ctx.navigate(URL, Duration::from_secs(1)).await.unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_present_is_satisfied_immediately() {
        let mut ctx = loaded(FixturePage::new(r#"<p class="card">a</p>"#)).await;
        let outcome = wait_for(ctx.as_mut(), Condition::Present(".card"), timing(0))
            .await
            .unwrap();
        assert!(outcome.is_satisfied());
    }

    #[tokio::test]
    async fn test_missing_element_times_out() {
        let mut ctx = loaded(FixturePage::new("<p>a</p>")).await;
        let outcome = wait_for(ctx.as_mut(), Condition::Present(".card"), timing(30))
            .await
            .unwrap();
        match outcome {
            WaitOutcome::TimedOut { elapsed } => assert!(elapsed >= Duration::from_millis(30)),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_actionable_and_count_conditions() {
        let mut ctx = loaded(FixturePage::with_load_more(
            r#"<p class="card">a</p>"#,
            "more",
            vec![r#"<p class="card">b</p>"#.to_string()],
        ))
        .await;

        assert!(Condition::Actionable("#more").holds(ctx.as_mut()).await.unwrap());
        assert!(!Condition::CountAbove(".card", 1).holds(ctx.as_mut()).await.unwrap());

        let button = ctx.find_all("#more").await.unwrap()[0];
        ctx.click(button).await.unwrap();

        assert!(Condition::CountAbove(".card", 1).holds(ctx.as_mut()).await.unwrap());
        assert!(!Condition::Actionable("#more").holds(ctx.as_mut()).await.unwrap());
        assert!(!Condition::Actionable("#absent").holds(ctx.as_mut()).await.unwrap());
    }

    #[tokio::test]
    async fn test_height_changed() {
        let mut ctx = loaded(FixturePage::with_infinite_scroll(
            "<p>a</p>",
            vec!["<p>b</p>".to_string()],
        ))
        .await;
        let baseline = ctx.document_height().await.unwrap();
        assert!(!Condition::HeightChanged(baseline).holds(ctx.as_mut()).await.unwrap());

        ctx.scroll_to_bottom().await.unwrap();
        let outcome = wait_for(ctx.as_mut(), Condition::HeightChanged(baseline), timing(50))
            .await
            .unwrap();
        assert!(outcome.is_satisfied());
    }
}
