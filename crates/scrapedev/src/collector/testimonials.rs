//! Testimonials: an infinite-scroll page, scrolled until its height settles.

use super::extract::{required_attribute, required_text, Harvest};
use super::{log_phase, Phase};
use crate::config::CollectorConfig;
use crate::renderer::{ElementHandle, RenderContext};
use crate::types::{CollectResult, Collected, CollectionStatus, RecordKind, Testimonial};
use crate::wait::{wait_for, Condition};

const KIND: RecordKind = RecordKind::Testimonial;

pub(super) async fn collect(
    ctx: &mut dyn RenderContext,
    config: &CollectorConfig,
) -> CollectResult<Collected<Testimonial>> {
    let selectors = &config.selectors;
    let url = config.testimonials_url()?;

    log_phase(KIND, Phase::Navigating);
    ctx.navigate(&url, config.navigation_timeout()).await?;

    log_phase(KIND, Phase::WaitingForContent);
    let status = scroll_until_settled(ctx, config).await?;

    log_phase(KIND, Phase::Extracting);
    let cards = ctx.find_all(&selectors.testimonial_card).await?;
    let mut harvest = Harvest::new(KIND, config.extraction_policy);
    harvest.begin_batch(cards.len());
    for (index, card) in cards.into_iter().enumerate() {
        let testimonial = extract(ctx, config, card, index).await;
        harvest.accept(index, testimonial)?;
    }

    let collected = harvest.finish(status);
    log_phase(KIND, Phase::Done);
    tracing::info!(
        testimonials = collected.records.len(),
        skipped = collected.skipped.len(),
        "collected testimonials"
    );
    Ok(collected)
}

/// Scroll to the bottom until the document height stops changing.
///
/// Always scrolls at least once. Gives up after `max_scrolls` and reports
/// the source as still growing.
pub(crate) async fn scroll_until_settled(
    ctx: &mut dyn RenderContext,
    config: &CollectorConfig,
) -> CollectResult<CollectionStatus> {
    let mut last = ctx.document_height().await?;
    let mut scrolls = 0;

    loop {
        if scrolls >= config.max_scrolls {
            tracing::warn!(
                scrolls,
                height = last,
                "document still growing after the scroll limit; collection incomplete"
            );
            return Ok(CollectionStatus::SourceStillGrowing { scrolls });
        }

        ctx.scroll_to_bottom().await?;
        scrolls += 1;
        wait_for(ctx, Condition::HeightChanged(last), config.scroll_settle_wait()).await?;

        let height = ctx.document_height().await?;
        if height == last {
            tracing::debug!(scrolls, height, "document height settled");
            return Ok(CollectionStatus::Complete);
        }
        tracing::trace!(scrolls, from = last, to = height, "document grew");
        last = height;
    }
}

async fn extract(
    ctx: &mut dyn RenderContext,
    config: &CollectorConfig,
    card: ElementHandle,
    index: usize,
) -> CollectResult<Testimonial> {
    let selectors = &config.selectors;
    let text = required_text(ctx, card, &selectors.testimonial_text, KIND, index).await?;
    let user = required_attribute(
        ctx,
        card,
        &selectors.testimonial_author,
        &selectors.testimonial_author_attribute,
        KIND,
        index,
    )
    .await?;
    Ok(Testimonial { user, text })
}
