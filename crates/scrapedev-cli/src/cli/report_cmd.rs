//! `scrapedev report`: summarize a persisted dataset.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use scrapedev::report::{parse_month, reviews_in_month, DatasetReport, MONTH_NAMES};
use scrapedev::{Dataset, Review};

use super::output::Output;

/// Width of the longest histogram bar.
const BAR_WIDTH: usize = 40;

#[derive(Serialize)]
struct ReportJson<'a> {
    #[serde(flatten)]
    report: &'a DatasetReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    month: Option<MonthJson<'a>>,
}

#[derive(Serialize)]
struct MonthJson<'a> {
    month: u32,
    reviews: Vec<&'a Review>,
}

/// Run the report command.
pub async fn run(input: &Path, year: i32, month: Option<&str>, output: Output) -> Result<()> {
    let dataset = Dataset::read_from_file(input)
        .with_context(|| format!("failed to read dataset {}", input.display()))?;
    if dataset.is_empty() {
        tracing::warn!(input = %input.display(), "dataset has no records");
    }

    let month = match month {
        Some(raw) => match parse_month(raw) {
            Some(m) => Some(m),
            None => bail!("unrecognized month {raw:?}"),
        },
        None => None,
    };

    let report = DatasetReport::build(&dataset, year);
    let listed = month.map(|m| (m, reviews_in_month(&dataset, year, m)));

    output.text(render_report(input, &report));
    if let Some((m, reviews)) = &listed {
        output.text(render_month(year, *m, reviews));
    }
    output.json(&ReportJson {
        report: &report,
        month: listed.map(|(month, reviews)| MonthJson { month, reviews }),
    })?;
    Ok(())
}

/// Counts per kind and a per-month review histogram.
pub fn render_report(input: &Path, report: &DatasetReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Dataset: {}", input.display());
    let _ = writeln!(out, "  Reviews:      {}", report.reviews);
    let _ = writeln!(out, "  Products:     {}", report.products);
    let _ = writeln!(out, "  Testimonials: {}", report.testimonials);
    let _ = writeln!(out);
    let _ = writeln!(out, "Reviews by month ({}):", report.year);

    let max = report.reviews_by_month.iter().copied().max().unwrap_or(0);
    for (name, &count) in MONTH_NAMES.iter().zip(report.reviews_by_month.iter()) {
        let bar = if max == 0 { 0 } else { count * BAR_WIDTH / max };
        let _ = writeln!(out, "  {name}  {count:>4}  {}", "#".repeat(bar));
    }

    let other = report.reviews_other_years();
    if other > 0 {
        let _ = writeln!(out, "  ({other} reviews dated outside {})", report.year);
    }
    out
}

/// The reviews of one month (1-based), in dataset order.
pub fn render_month(year: i32, month: u32, reviews: &[&Review]) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let Some(name) = month.checked_sub(1).and_then(|i| MONTH_NAMES.get(i as usize)) else {
        let _ = writeln!(out, "No such month: {month}.");
        return out;
    };
    if reviews.is_empty() {
        let _ = writeln!(out, "No reviews found for {name} {year}.");
        return out;
    }
    let _ = writeln!(out, "Reviews for {name} {year}:");
    for review in reviews {
        let _ = writeln!(out, "  {}  {}", review.date, review.content);
    }
    out
}
