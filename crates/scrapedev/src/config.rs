//! Collector configuration: defaults, JSON config files and env overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::renderer::chromium::CHROMIUM_PATH_ENV;
use crate::types::{CollectError, CollectResult};
use crate::wait::WaitSpec;

/// Environment variable naming a JSON config file.
pub const CONFIG_PATH_ENV: &str = "SCRAPEDEV_CONFIG";

/// Environment variable overriding the target site.
pub const BASE_URL_ENV: &str = "SCRAPEDEV_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://web-scraping.dev";

/// What to do when a single card cannot be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionPolicy {
    /// Log the card, count it as skipped and keep going.
    #[default]
    Skip,
    /// Fail the whole run on the first bad card.
    Abort,
}

/// CSS selectors and attribute names describing the target markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub reviews_path: String,
    pub products_path: String,
    pub testimonials_path: String,
    pub load_more: String,
    pub review_card: String,
    pub review_date: String,
    pub review_text: String,
    pub product_card: String,
    pub product_title: String,
    pub product_price: String,
    pub testimonial_card: String,
    pub testimonial_text: String,
    pub testimonial_author: String,
    pub testimonial_author_attribute: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            reviews_path: "reviews".into(),
            products_path: "products".into(),
            testimonials_path: "testimonials".into(),
            load_more: "#page-load-more".into(),
            review_card: ".review".into(),
            review_date: r#"[data-testid="review-date"]"#.into(),
            review_text: r#"[data-testid="review-text"]"#.into(),
            product_card: ".product".into(),
            product_title: "h3.mb-0 a".into(),
            product_price: ".price".into(),
            testimonial_card: ".testimonial".into(),
            testimonial_text: ".text".into(),
            testimonial_author: "identicon-svg".into(),
            testimonial_author_attribute: "username".into(),
        }
    }
}

/// Browser launch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Explicit Chromium binary; discovered when absent.
    pub chromium_path: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            window_width: 1280,
            window_height: 900,
        }
    }
}

/// Full configuration of a collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub base_url: String,
    /// Maximum load-more activations on the reviews page.
    pub load_more_clicks: u32,
    /// Number of product listing pages fetched, always all of them.
    pub product_pages: u32,
    /// Upper bound on scrolls before testimonials are reported incomplete.
    pub max_scrolls: u32,
    pub navigation_timeout_ms: u64,
    /// How long to wait for the load-more control to become actionable.
    pub control_timeout_ms: u64,
    /// How long to wait for new cards after a click or page load.
    pub settle_ms: u64,
    /// How long to wait for the document to grow after a scroll.
    pub scroll_settle_ms: u64,
    pub poll_interval_ms: u64,
    pub extraction_policy: ExtractionPolicy,
    pub selectors: Selectors,
    pub browser: BrowserSettings,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            load_more_clicks: 3,
            product_pages: 5,
            max_scrolls: 50,
            navigation_timeout_ms: 30_000,
            control_timeout_ms: 10_000,
            settle_ms: 1_500,
            scroll_settle_ms: 2_000,
            poll_interval_ms: 100,
            extraction_policy: ExtractionPolicy::Skip,
            selectors: Selectors::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl CollectorConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> CollectResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| CollectError::Config(format!("{}: {e}", path.display())))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.is_empty()) {
            self.base_url = base_url;
        }
        if let Some(path) = lookup(CHROMIUM_PATH_ENV).filter(|v| !v.is_empty()) {
            self.browser.chromium_path = Some(PathBuf::from(path));
        }
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> CollectResult<()> {
        let base = self.base()?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(CollectError::Config(format!(
                "base_url must be http or https, got {}",
                base.scheme()
            )));
        }
        if self.product_pages == 0 {
            return Err(CollectError::Config("product_pages must be at least 1".into()));
        }
        if self.max_scrolls == 0 {
            return Err(CollectError::Config("max_scrolls must be at least 1".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(CollectError::Config("poll_interval_ms must be positive".into()));
        }
        Ok(())
    }

    fn base(&self) -> CollectResult<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw)
            .map_err(|e| CollectError::Config(format!("invalid base_url {:?}: {e}", self.base_url)))
    }

    fn page_url(&self, path: &str) -> CollectResult<Url> {
        self.base()?
            .join(path.trim_start_matches('/'))
            .map_err(|e| CollectError::Config(format!("invalid page path {path:?}: {e}")))
    }

    pub fn reviews_url(&self) -> CollectResult<String> {
        Ok(self.page_url(&self.selectors.reviews_path)?.to_string())
    }

    pub fn products_url(&self, page: u32) -> CollectResult<String> {
        let mut url = self.page_url(&self.selectors.products_path)?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        Ok(url.to_string())
    }

    pub fn testimonials_url(&self) -> CollectResult<String> {
        Ok(self.page_url(&self.selectors.testimonials_path)?.to_string())
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    fn wait(&self, timeout_ms: u64) -> WaitSpec {
        WaitSpec::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    pub fn control_wait(&self) -> WaitSpec {
        self.wait(self.control_timeout_ms)
    }

    pub fn settle_wait(&self) -> WaitSpec {
        self.wait(self.settle_ms)
    }

    pub fn scroll_settle_wait(&self) -> WaitSpec {
        self.wait(self.scroll_settle_ms)
    }
}

/// Resolve the config file path: explicit flag, then `SCRAPEDEV_CONFIG`,
/// then `scrapedev.json` in the working directory if it exists.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var(CONFIG_PATH_ENV) {
        if !env_path.is_empty() {
            return Some(PathBuf::from(env_path));
        }
    }

    let cwd_config = PathBuf::from("scrapedev.json");
    cwd_config.exists().then_some(cwd_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_urls() {
        let config = CollectorConfig::default();
        assert_eq!(
            config.reviews_url().unwrap(),
            "https://web-scraping.dev/reviews"
        );
        assert_eq!(
            config.products_url(3).unwrap(),
            "https://web-scraping.dev/products?page=3"
        );
        assert_eq!(
            config.testimonials_url().unwrap(),
            "https://web-scraping.dev/testimonials"
        );
    }

    #[test]
    fn test_base_url_with_path_prefix() {
        let config = CollectorConfig {
            base_url: "http://localhost:8080/demo".into(),
            ..Default::default()
        };
        assert_eq!(
            config.reviews_url().unwrap(),
            "http://localhost:8080/demo/reviews"
        );
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"product_pages": 2, "selectors": {{"product_price": ".cost"}}, "extraction_policy": "abort"}}"#
        )
        .unwrap();

        let config = CollectorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.product_pages, 2);
        assert_eq!(config.selectors.product_price, ".cost");
        assert_eq!(config.selectors.product_card, ".product");
        assert_eq!(config.extraction_policy, ExtractionPolicy::Abort);
        assert_eq!(config.load_more_clicks, 3);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            CollectorConfig::from_file(file.path()),
            Err(CollectError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = CollectorConfig::default();
        config.apply_env_from(|key| match key {
            BASE_URL_ENV => Some("http://127.0.0.1:9000".into()),
            CHROMIUM_PATH_ENV => Some("/opt/chrome/chrome".into()),
            _ => None,
        });
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(
            config.browser.chromium_path,
            Some(PathBuf::from("/opt/chrome/chrome"))
        );

        let before = config.clone();
        config.apply_env_from(|_| Some(String::new()));
        assert_eq!(config, before);
    }

    #[test]
    fn test_validate() {
        assert!(CollectorConfig::default().validate().is_ok());

        let bad = [
            CollectorConfig {
                base_url: "not a url".into(),
                ..Default::default()
            },
            CollectorConfig {
                base_url: "ftp://example.com".into(),
                ..Default::default()
            },
            CollectorConfig {
                product_pages: 0,
                ..Default::default()
            },
            CollectorConfig {
                max_scrolls: 0,
                ..Default::default()
            },
            CollectorConfig {
                poll_interval_ms: 0,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(CollectError::Config(_))),
                "{config:?} should be rejected"
            );
        }
    }
}
