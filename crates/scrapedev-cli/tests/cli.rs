//! Integration tests for the scrapedev command layer.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use scrapedev::{CollectionStatus, Dataset, ExtractionPolicy, KindSummary, Review, RunSummary};
use scrapedev_cli::cli::collect_cmd::{render_summary, resolve_config_with, CollectArgs};
use scrapedev_cli::cli::report_cmd::{render_month, render_report};

// ─────────────────────── helpers ───────────────────────

fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("scrapedev.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path
}

fn no_env(_: &str) -> Option<String> {
    None
}

fn kind(collected: usize, skipped: usize, status: CollectionStatus) -> KindSummary {
    KindSummary {
        collected,
        cards_seen: collected + skipped,
        skipped,
        status,
    }
}

fn review(y: i32, m: u32, d: u32, content: &str) -> Review {
    Review {
        date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        content: content.into(),
    }
}

// ─────────────────────── config layering ───────────────────────

#[test]
fn test_file_values_fill_unset_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, r#"{ "product_pages": 2, "max_scrolls": 7 }"#);
    let args = CollectArgs {
        config: Some(path),
        ..Default::default()
    };

    let config = resolve_config_with(&args, no_env).unwrap();
    assert_eq!(config.product_pages, 2);
    assert_eq!(config.max_scrolls, 7);
    assert_eq!(config.load_more_clicks, 3);
    assert_eq!(config.base_url, "https://web-scraping.dev");
}

#[test]
fn test_env_overrides_file_and_flags_override_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, r#"{ "base_url": "https://from-file.test" }"#);
    let env = |key: &str| match key {
        "SCRAPEDEV_BASE_URL" => Some("https://from-env.test".to_string()),
        "SCRAPEDEV_CHROMIUM_PATH" => Some("/opt/env-chrome".to_string()),
        _ => None,
    };

    let args = CollectArgs {
        config: Some(path.clone()),
        ..Default::default()
    };
    let config = resolve_config_with(&args, env).unwrap();
    assert_eq!(config.base_url, "https://from-env.test");
    assert_eq!(
        config.browser.chromium_path.as_deref(),
        Some(Path::new("/opt/env-chrome"))
    );

    let args = CollectArgs {
        config: Some(path),
        base_url: Some("https://from-flag.test".into()),
        chromium: Some("/usr/bin/flag-chrome".into()),
        headful: true,
        strict: true,
        ..Default::default()
    };
    let config = resolve_config_with(&args, env).unwrap();
    assert_eq!(config.base_url, "https://from-flag.test");
    assert_eq!(
        config.browser.chromium_path.as_deref(),
        Some(Path::new("/usr/bin/flag-chrome"))
    );
    assert!(!config.browser.headless);
    assert_eq!(config.extraction_policy, ExtractionPolicy::Abort);
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, r#"{ "product_pages": 0 }"#);
    let args = CollectArgs {
        config: Some(path),
        ..Default::default()
    };
    let err = resolve_config_with(&args, no_env).unwrap_err();
    assert!(format!("{err:#}").contains("product_pages"));

    let args = CollectArgs {
        base_url: Some("ftp://shop.test".into()),
        config: Some(write_config(&dir, "{}")),
        ..Default::default()
    };
    assert!(resolve_config_with(&args, no_env).is_err());
}

#[test]
fn test_malformed_config_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "{ not json");
    let args = CollectArgs {
        config: Some(path),
        ..Default::default()
    };
    let err = resolve_config_with(&args, no_env).unwrap_err();
    assert!(format!("{err:#}").contains("scrapedev.json"));
}

// ─────────────────────── rendering ───────────────────────

#[test]
fn test_summary_lists_counts_and_destination() {
    let summary = RunSummary {
        reviews: kind(20, 0, CollectionStatus::Complete),
        products: kind(25, 0, CollectionStatus::Complete),
        testimonials: kind(60, 0, CollectionStatus::Complete),
        output: Some(PathBuf::from("combined_data.json")),
    };
    let text = render_summary(&summary);
    assert!(text.contains("- 20 Reviews"));
    assert!(text.contains("- 25 Products"));
    assert!(text.contains("- 60 Testimonials"));
    assert!(text.contains("Saved to combined_data.json"));
    assert!(!text.contains("skipped"));
}

#[test]
fn test_summary_notes_incomplete_kinds() {
    let summary = RunSummary {
        reviews: kind(19, 1, CollectionStatus::Complete),
        products: kind(25, 0, CollectionStatus::Complete),
        testimonials: kind(500, 0, CollectionStatus::SourceStillGrowing { scrolls: 50 }),
        output: None,
    };
    let text = render_summary(&summary);
    assert!(text.contains("Reviews: 1 of 20 cards skipped"));
    assert!(text.contains("Testimonials: still growing after 50 scrolls"));
    assert!(!text.contains("Products:"));
    assert!(!text.contains("Saved to"));
}

#[test]
fn test_report_histogram_and_month_listing() {
    let dataset = Dataset {
        reviews: vec![
            review(2023, 5, 1, "first may"),
            review(2023, 5, 3, "second may"),
            review(2022, 1, 1, "older"),
        ],
        ..Default::default()
    };
    let report = scrapedev::report::DatasetReport::build(&dataset, 2023);
    let text = render_report(Path::new("data.json"), &report);
    assert!(text.contains("Dataset: data.json"));
    assert!(text.contains("Reviews:      3"));
    assert!(text.contains("Reviews by month (2023):"));
    assert!(text.contains(&format!("  May     2  {}", "#".repeat(40))));
    assert!(text.contains("  Jan     0  \n"));
    assert!(text.contains("(1 reviews dated outside 2023)"));

    let may = scrapedev::report::reviews_in_month(&dataset, 2023, 5);
    let listing = render_month(2023, 5, &may);
    assert!(listing.contains("Reviews for May 2023:"));
    assert!(listing.contains("2023-05-01  first may"));

    let empty = render_month(2023, 6, &[]);
    assert!(empty.contains("No reviews found for Jun 2023."));
}

#[test]
fn test_month_listing_rejects_out_of_range_months() {
    assert!(render_month(2023, 0, &[]).contains("No such month: 0."));
    assert!(render_month(2023, 13, &[]).contains("No such month: 13."));
    assert!(render_month(2023, 12, &[]).contains("No reviews found for Dec 2023."));
}
