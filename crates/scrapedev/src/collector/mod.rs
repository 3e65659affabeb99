//! The collector: drives one render context through the three target views.
//!
//! Every operation walks the same phases, `Navigating → WaitingForContent →
//! Extracting → Done`, with the waiting phase looping under its own
//! continuation rule (load-more activations, a fixed page count, or scroll
//! height convergence). There is no retry phase: a wait that times out means
//! "carry on with what is rendered".
//!
//! The collector owns its renderer for its whole lifetime. [`Collector::close`]
//! consumes it, so the browser is released exactly once; [`run`] guarantees
//! that release on every exit path.

mod extract;
mod products;
mod reviews;
mod testimonials;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::CollectorConfig;
use crate::dataset::Dataset;
use crate::renderer::{RenderContext, Renderer};
use crate::types::{
    CollectError, CollectResult, Collected, CollectionStatus, Product, RecordKind, Review,
    Testimonial,
};

/// Phase of a collection operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Navigating,
    WaitingForContent,
    Extracting,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Navigating => "navigating",
            Phase::WaitingForContent => "waiting_for_content",
            Phase::Extracting => "extracting",
            Phase::Done => "done",
        }
    }
}

fn log_phase(kind: RecordKind, phase: Phase) {
    tracing::debug!(kind = %kind, phase = phase.as_str(), "phase");
}

/// Per-kind outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct KindSummary {
    pub collected: usize,
    pub cards_seen: usize,
    pub skipped: usize,
    #[serde(flatten)]
    pub status: CollectionStatus,
}

impl KindSummary {
    pub fn of<T>(collected: &Collected<T>) -> Self {
        Self {
            collected: collected.records.len(),
            cards_seen: collected.cards_seen,
            skipped: collected.skipped.len(),
            status: collected.status,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.skipped == 0 && self.status == CollectionStatus::Complete
    }
}

/// Outcome of a full collection run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub reviews: KindSummary,
    pub products: KindSummary,
    pub testimonials: KindSummary,
    /// Where the dataset was written, once persisted.
    pub output: Option<PathBuf>,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        self.reviews.is_complete()
            && self.products.is_complete()
            && self.testimonials.is_complete()
    }
}

/// Drives a single render context through the collection operations.
pub struct Collector {
    renderer: Box<dyn Renderer>,
    ctx: Box<dyn RenderContext>,
    config: CollectorConfig,
}

impl Collector {
    /// Validate the config and open a context on `renderer`.
    ///
    /// On failure the renderer is shut down before the error is returned.
    pub async fn new(
        mut renderer: Box<dyn Renderer>,
        config: CollectorConfig,
    ) -> CollectResult<Self> {
        let ctx = match config.validate() {
            Ok(()) => renderer.new_context().await.map_err(CollectError::from),
            Err(e) => Err(e),
        };

        match ctx {
            Ok(ctx) => Ok(Self {
                renderer,
                ctx,
                config,
            }),
            Err(e) => {
                if let Err(shutdown) = renderer.shutdown().await {
                    tracing::warn!("failed to shut down renderer: {shutdown:#}");
                }
                Err(e)
            }
        }
    }

    /// Reviews page, extended by up to `load_more_clicks` activations.
    pub async fn collect_reviews(&mut self) -> CollectResult<Collected<Review>> {
        reviews::collect(self.ctx.as_mut(), &self.config).await
    }

    /// Product pages `1..=product_pages`, concatenated in page order.
    pub async fn collect_products(&mut self) -> CollectResult<Collected<Product>> {
        products::collect(self.ctx.as_mut(), &self.config).await
    }

    /// Testimonials page, scrolled until its height settles.
    pub async fn collect_testimonials(&mut self) -> CollectResult<Collected<Testimonial>> {
        testimonials::collect(self.ctx.as_mut(), &self.config).await
    }

    /// Run the three operations in sequence.
    pub async fn collect_all(&mut self) -> CollectResult<(Dataset, RunSummary)> {
        let reviews = self.collect_reviews().await?;
        let products = self.collect_products().await?;
        let testimonials = self.collect_testimonials().await?;

        let summary = RunSummary {
            reviews: KindSummary::of(&reviews),
            products: KindSummary::of(&products),
            testimonials: KindSummary::of(&testimonials),
            output: None,
        };
        let dataset = Dataset {
            reviews: reviews.records,
            products: products.records,
            testimonials: testimonials.records,
        };
        Ok((dataset, summary))
    }

    /// Close the context and shut down the renderer.
    pub async fn close(self) -> CollectResult<()> {
        let closed = self.ctx.close().await;
        let shutdown = self.renderer.shutdown().await;
        closed?;
        shutdown?;
        Ok(())
    }
}

/// Collect everything, write the dataset to `output`, and release the
/// renderer whether or not collection succeeded.
pub async fn run(
    renderer: Box<dyn Renderer>,
    config: CollectorConfig,
    output: &Path,
) -> CollectResult<RunSummary> {
    let mut collector = Collector::new(renderer, config).await?;
    let result = collect_and_write(&mut collector, output).await;
    let released = collector.close().await;

    match (result, released) {
        (Ok(summary), Ok(())) => Ok(summary),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release)) => {
            tracing::warn!("failed to release browser after error: {release}");
            Err(e)
        }
    }
}

async fn collect_and_write(collector: &mut Collector, output: &Path) -> CollectResult<RunSummary> {
    let (dataset, mut summary) = collector.collect_all().await?;
    dataset.write_to_file(output)?;
    tracing::info!(output = %output.display(), "dataset written");
    summary.output = Some(output.to_path_buf());
    Ok(summary)
}
