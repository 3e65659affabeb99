//! Read-side summaries over a persisted dataset.
//!
//! Mirrors the month filter the downstream dashboard applies to review dates,
//! so a run can be sanity-checked from the terminal.

use chrono::Datelike;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::types::Review;

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Parse a month as a number (`5`), short name (`May`) or full name (`may`).
/// Returns 1-based month numbers.
pub fn parse_month(input: &str) -> Option<u32> {
    let input = input.trim();
    if let Ok(n) = input.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let lower = input.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    (1..=12u8)
        .find(|&n| {
            chrono::Month::try_from(n)
                .map(|m| m.name().to_ascii_lowercase().starts_with(&lower))
                .unwrap_or(false)
        })
        .map(u32::from)
}

/// Reviews dated in the given year and month, in dataset order.
pub fn reviews_in_month(dataset: &Dataset, year: i32, month: u32) -> Vec<&Review> {
    dataset
        .reviews
        .iter()
        .filter(|r| r.date.year() == year && r.date.month() == month)
        .collect()
}

/// Summary counts for a dataset and one calendar year of reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetReport {
    pub reviews: usize,
    pub products: usize,
    pub testimonials: usize,
    pub year: i32,
    /// Reviews per month of `year`, January first.
    pub reviews_by_month: [usize; 12],
}

impl DatasetReport {
    pub fn build(dataset: &Dataset, year: i32) -> Self {
        let mut reviews_by_month = [0; 12];
        for review in dataset.reviews.iter().filter(|r| r.date.year() == year) {
            reviews_by_month[review.date.month0() as usize] += 1;
        }
        Self {
            reviews: dataset.reviews.len(),
            products: dataset.products.len(),
            testimonials: dataset.testimonials.len(),
            year,
            reviews_by_month,
        }
    }

    /// Reviews outside `year`.
    pub fn reviews_other_years(&self) -> usize {
        self.reviews - self.reviews_by_month.iter().sum::<usize>()
    }
}
