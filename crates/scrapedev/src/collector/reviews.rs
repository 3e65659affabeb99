//! Reviews: a single page extended by a load-more button.

use anyhow::Result;

use super::extract::{parse_review_date, required_text, Harvest};
use super::{log_phase, Phase};
use crate::config::CollectorConfig;
use crate::renderer::{ElementHandle, RenderContext};
use crate::types::{CollectResult, Collected, CollectionStatus, RecordKind, Review};
use crate::wait::{wait_for, Condition};

const KIND: RecordKind = RecordKind::Review;

pub(super) async fn collect(
    ctx: &mut dyn RenderContext,
    config: &CollectorConfig,
) -> CollectResult<Collected<Review>> {
    let selectors = &config.selectors;
    let url = config.reviews_url()?;

    log_phase(KIND, Phase::Navigating);
    ctx.navigate(&url, config.navigation_timeout()).await?;

    log_phase(KIND, Phase::WaitingForContent);
    let mut activations = 0;
    for attempt in 1..=config.load_more_clicks {
        match load_more(ctx, config).await {
            Ok(true) => activations += 1,
            Ok(false) => {
                tracing::debug!(attempt, "load-more control not actionable, stopping");
                break;
            }
            Err(e) => {
                tracing::warn!(attempt, "load-more failed, stopping: {e:#}");
                break;
            }
        }
    }

    log_phase(KIND, Phase::Extracting);
    let cards = ctx.find_all(&selectors.review_card).await?;
    let mut harvest = Harvest::new(KIND, config.extraction_policy);
    harvest.begin_batch(cards.len());
    for (index, card) in cards.into_iter().enumerate() {
        let review = extract(ctx, config, card, index).await;
        harvest.accept(index, review)?;
    }

    let collected = harvest.finish(CollectionStatus::Complete);
    log_phase(KIND, Phase::Done);
    tracing::info!(
        reviews = collected.records.len(),
        skipped = collected.skipped.len(),
        activations,
        "collected reviews"
    );
    Ok(collected)
}

/// One load-more activation. `Ok(false)` when the control never became
/// actionable within the control wait.
async fn load_more(ctx: &mut dyn RenderContext, config: &CollectorConfig) -> Result<bool> {
    let selectors = &config.selectors;

    let ready = wait_for(
        ctx,
        Condition::Actionable(&selectors.load_more),
        config.control_wait(),
    )
    .await?;
    if !ready.is_satisfied() {
        return Ok(false);
    }
    let Some(&control) = ctx.find_all(&selectors.load_more).await?.first() else {
        return Ok(false);
    };

    let before = ctx.count(&selectors.review_card).await?;
    ctx.click(control).await?;

    let settled = wait_for(
        ctx,
        Condition::CountAbove(&selectors.review_card, before),
        config.settle_wait(),
    )
    .await?;
    if !settled.is_satisfied() {
        tracing::debug!(before, "no new reviews within the settle interval");
    }
    Ok(true)
}

async fn extract(
    ctx: &mut dyn RenderContext,
    config: &CollectorConfig,
    card: ElementHandle,
    index: usize,
) -> CollectResult<Review> {
    let selectors = &config.selectors;
    let date = required_text(ctx, card, &selectors.review_date, KIND, index).await?;
    let content = required_text(ctx, card, &selectors.review_text, KIND, index).await?;
    Ok(Review {
        date: parse_review_date(&date, index)?,
        content,
    })
}
