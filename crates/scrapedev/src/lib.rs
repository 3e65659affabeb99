//! scrapedev: browser-driven collector for the web-scraping.dev demo site.
//!
//! Collects reviews (load-more), products (pagination) and testimonials
//! (infinite scroll) through a [`renderer::RenderContext`], then persists
//! them as a single JSON [`Dataset`].

pub mod collector;
pub mod config;
pub mod dataset;
pub mod renderer;
pub mod report;
pub mod types;
pub mod wait;

pub use collector::{run, Collector, KindSummary, Phase, RunSummary};
pub use config::{BrowserSettings, CollectorConfig, ExtractionPolicy, Selectors};
pub use dataset::Dataset;
pub use renderer::chromium::ChromiumRenderer;
pub use renderer::fixture::{FixturePage, FixtureRenderer, FixtureSite};
pub use renderer::{ElementHandle, RenderContext, Renderer};
pub use types::*;
pub use wait::{wait_for, Condition, WaitOutcome, WaitSpec};
