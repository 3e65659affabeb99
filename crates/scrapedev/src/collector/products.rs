//! Products: a fixed number of paginated listing pages.

use super::extract::{required_text, Harvest};
use super::{log_phase, Phase};
use crate::config::CollectorConfig;
use crate::renderer::{ElementHandle, RenderContext};
use crate::types::{CollectResult, Collected, CollectionStatus, Product, RecordKind};
use crate::wait::{wait_for, Condition};

const KIND: RecordKind = RecordKind::Product;

/// Fetch every page in `1..=product_pages`, even when a page is empty.
pub(super) async fn collect(
    ctx: &mut dyn RenderContext,
    config: &CollectorConfig,
) -> CollectResult<Collected<Product>> {
    let selectors = &config.selectors;
    let mut harvest = Harvest::new(KIND, config.extraction_policy);

    for page in 1..=config.product_pages {
        let url = config.products_url(page)?;

        log_phase(KIND, Phase::Navigating);
        ctx.navigate(&url, config.navigation_timeout()).await?;

        log_phase(KIND, Phase::WaitingForContent);
        let rendered = wait_for(
            ctx,
            Condition::Present(&selectors.product_card),
            config.settle_wait(),
        )
        .await?;
        if !rendered.is_satisfied() {
            tracing::debug!(page, "no product cards rendered");
        }

        log_phase(KIND, Phase::Extracting);
        let cards = ctx.find_all(&selectors.product_card).await?;
        tracing::debug!(page, cards = cards.len(), "product page loaded");
        let offset = harvest.begin_batch(cards.len());
        for (i, card) in cards.into_iter().enumerate() {
            let index = offset + i;
            let product = extract(ctx, config, card, index).await;
            harvest.accept(index, product)?;
        }
    }

    let collected = harvest.finish(CollectionStatus::Complete);
    log_phase(KIND, Phase::Done);
    tracing::info!(
        products = collected.records.len(),
        skipped = collected.skipped.len(),
        pages = config.product_pages,
        "collected products"
    );
    Ok(collected)
}

async fn extract(
    ctx: &mut dyn RenderContext,
    config: &CollectorConfig,
    card: ElementHandle,
    index: usize,
) -> CollectResult<Product> {
    let selectors = &config.selectors;
    Ok(Product {
        title: required_text(ctx, card, &selectors.product_title, KIND, index).await?,
        price: required_text(ctx, card, &selectors.product_price, KIND, index).await?,
    })
}
