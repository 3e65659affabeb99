//! `scrapedev collect`: run all three collections and write the dataset.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use scrapedev::config::resolve_config_path;
use scrapedev::{
    ChromiumRenderer, CollectionStatus, CollectorConfig, ExtractionPolicy, KindSummary, RunSummary,
};

use super::output::Output;

/// Flags accepted by `collect`.
#[derive(Debug, Clone, Default)]
pub struct CollectArgs {
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub base_url: Option<String>,
    pub headful: bool,
    pub chromium: Option<PathBuf>,
    pub strict: bool,
}

/// Build the effective config: file, then environment, then flags.
pub fn resolve_config(args: &CollectArgs) -> Result<CollectorConfig> {
    resolve_config_with(args, |key| std::env::var(key).ok())
}

pub fn resolve_config_with(
    args: &CollectArgs,
    env: impl Fn(&str) -> Option<String>,
) -> Result<CollectorConfig> {
    let mut config = match resolve_config_path(args.config.as_deref()) {
        Some(path) => CollectorConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CollectorConfig::default(),
    };

    config.apply_env_from(env);

    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if args.headful {
        config.browser.headless = false;
    }
    if let Some(path) = &args.chromium {
        config.browser.chromium_path = Some(path.clone());
    }
    if args.strict {
        config.extraction_policy = ExtractionPolicy::Abort;
    }

    config.validate()?;
    Ok(config)
}

/// Run the collect command.
pub async fn run(args: CollectArgs, output: Output) -> Result<()> {
    let config = resolve_config(&args)?;
    output.status(format!("Collecting from {}...", config.base_url));

    let renderer = ChromiumRenderer::launch(&config.browser).await?;
    let summary = scrapedev::run(Box::new(renderer), config, &args.output).await?;

    output.text(render_summary(&summary));
    output.json(&summary)?;
    Ok(())
}

/// Text summary of a finished run.
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::from("\nSUCCESS! Scraped:\n");
    let kinds = [
        ("Reviews", &summary.reviews),
        ("Products", &summary.products),
        ("Testimonials", &summary.testimonials),
    ];
    for (label, kind) in kinds {
        let _ = writeln!(out, "- {} {label}", kind.collected);
    }

    for (label, kind) in kinds {
        if let Some(note) = incomplete_note(kind) {
            let _ = writeln!(out, "  {label}: {note}");
        }
    }

    if let Some(path) = &summary.output {
        let _ = writeln!(out, "\nSaved to {}", path.display());
    }
    out
}

fn incomplete_note(kind: &KindSummary) -> Option<String> {
    let mut notes = Vec::new();
    if kind.skipped > 0 {
        notes.push(format!("{} of {} cards skipped", kind.skipped, kind.cards_seen));
    }
    if let CollectionStatus::SourceStillGrowing { scrolls } = kind.status {
        notes.push(format!("still growing after {scrolls} scrolls"));
    }
    (!notes.is_empty()).then(|| notes.join(", "))
}
