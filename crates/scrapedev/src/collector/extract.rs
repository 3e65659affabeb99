//! Per-card extraction helpers shared by the collection operations.

use chrono::NaiveDate;

use crate::config::ExtractionPolicy;
use crate::renderer::{ElementHandle, RenderContext};
use crate::types::{
    CollectError, CollectResult, Collected, CollectionStatus, RecordKind, SkippedCard,
    REVIEW_DATE_FORMAT,
};

/// First descendant of `card` matching `selector`, or a `MissingElement` error.
pub(crate) async fn required_element(
    ctx: &mut dyn RenderContext,
    card: ElementHandle,
    selector: &str,
    kind: RecordKind,
    index: usize,
) -> CollectResult<ElementHandle> {
    ctx.find_within(card, selector)
        .await?
        .first()
        .copied()
        .ok_or_else(|| CollectError::MissingElement {
            kind,
            index,
            selector: selector.to_string(),
        })
}

/// Trimmed text of the first descendant of `card` matching `selector`.
pub(crate) async fn required_text(
    ctx: &mut dyn RenderContext,
    card: ElementHandle,
    selector: &str,
    kind: RecordKind,
    index: usize,
) -> CollectResult<String> {
    let element = required_element(ctx, card, selector, kind, index).await?;
    Ok(ctx.read_text(element).await?.trim().to_string())
}

/// Value of `attribute` on the first descendant of `card` matching `selector`.
pub(crate) async fn required_attribute(
    ctx: &mut dyn RenderContext,
    card: ElementHandle,
    selector: &str,
    attribute: &str,
    kind: RecordKind,
    index: usize,
) -> CollectResult<String> {
    let element = required_element(ctx, card, selector, kind, index).await?;
    ctx.read_attribute(element, attribute)
        .await?
        .ok_or_else(|| CollectError::MissingAttribute {
            kind,
            index,
            attribute: attribute.to_string(),
        })
}

/// Parse review date text in the source format.
pub(crate) fn parse_review_date(raw: &str, index: usize) -> CollectResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), REVIEW_DATE_FORMAT).map_err(|source| {
        CollectError::InvalidDate {
            index,
            raw: raw.to_string(),
            source,
        }
    })
}

/// Accumulates records for one operation under an extraction policy.
pub(crate) struct Harvest<T> {
    kind: RecordKind,
    policy: ExtractionPolicy,
    records: Vec<T>,
    skipped: Vec<SkippedCard>,
    cards_seen: usize,
}

impl<T> Harvest<T> {
    pub(crate) fn new(kind: RecordKind, policy: ExtractionPolicy) -> Self {
        Self {
            kind,
            policy,
            records: Vec::new(),
            skipped: Vec::new(),
            cards_seen: 0,
        }
    }

    /// Register a batch of located cards; returns the index of its first card.
    pub(crate) fn begin_batch(&mut self, cards: usize) -> usize {
        let offset = self.cards_seen;
        self.cards_seen += cards;
        offset
    }

    /// Keep a record, or apply the policy to a failed card.
    pub(crate) fn accept(&mut self, index: usize, result: CollectResult<T>) -> CollectResult<()> {
        match result {
            Ok(record) => self.records.push(record),
            Err(e) if e.is_per_record() && self.policy == ExtractionPolicy::Skip => {
                tracing::warn!(kind = %self.kind, index, "skipping card: {e}");
                self.skipped.push(SkippedCard {
                    index,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    pub(crate) fn finish(self, status: CollectionStatus) -> Collected<T> {
        Collected {
            records: self.records,
            cards_seen: self.cards_seen,
            skipped: self.skipped,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_review_date() {
        let date = parse_review_date(" 2023-05-17\n", 0).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2023, 5, 17).unwrap());
        assert_eq!(date.format(REVIEW_DATE_FORMAT).to_string(), "2023-05-17");

        match parse_review_date("17/05/2023", 4) {
            Err(CollectError::InvalidDate { index, raw, .. }) => {
                assert_eq!(index, 4);
                assert_eq!(raw, "17/05/2023");
            }
            other => panic!("expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn test_skip_policy_records_failures() {
        let mut harvest = Harvest::new(RecordKind::Product, ExtractionPolicy::Skip);
        let offset = harvest.begin_batch(3);
        assert_eq!(offset, 0);

        harvest.accept(0, Ok("a")).unwrap();
        harvest
            .accept(
                1,
                Err(CollectError::MissingElement {
                    kind: RecordKind::Product,
                    index: 1,
                    selector: ".price".into(),
                }),
            )
            .unwrap();
        harvest.accept(2, Ok("c")).unwrap();
        assert_eq!(harvest.begin_batch(2), 3);

        let collected = harvest.finish(CollectionStatus::Complete);
        assert_eq!(collected.records, vec!["a", "c"]);
        assert_eq!(collected.cards_seen, 5);
        assert_eq!(collected.skipped.len(), 1);
        assert_eq!(collected.skipped[0].index, 1);
        assert!(collected.skipped[0].reason.contains(".price"));
        assert!(!collected.is_complete());
    }

    #[test]
    fn test_abort_policy_and_fatal_errors_propagate() {
        let mut harvest: Harvest<&str> = Harvest::new(RecordKind::Review, ExtractionPolicy::Abort);
        let missing = CollectError::MissingAttribute {
            kind: RecordKind::Review,
            index: 0,
            attribute: "username".into(),
        };
        assert!(harvest.accept(0, Err(missing)).is_err());

        let mut harvest: Harvest<&str> = Harvest::new(RecordKind::Review, ExtractionPolicy::Skip);
        let browser = CollectError::Browser(anyhow::anyhow!("connection lost"));
        assert!(harvest.accept(0, Err(browser)).is_err());
    }
}
