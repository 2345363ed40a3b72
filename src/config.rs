use crate::error::ConfigError;
use crate::parsers::images::ImagePattern;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which archive pages the download phase walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DownloadScope {
    /// Only archive links found by this run's discovery pass
    #[default]
    NewOnly,
    /// Every link in the ledger, old and new
    All,
}

/// Browser driven by the WebDriver endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Browser {
    #[default]
    Firefox,
    Chrome,
}

/// Settings for the browser-automation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebDriverConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default)]
    pub browser: Browser,

    /// Run the browser without a window
    #[serde(default = "default_true")]
    pub headless: bool,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            browser: Browser::default(),
            headless: true,
        }
    }
}

/// Configuration for a full discovery and ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root of the content host; archive links must live under it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Search page URL, `{year}` is replaced by the queried year
    #[serde(default = "default_search_url_template")]
    pub search_url_template: String,

    /// Exclusive lower bound of the queried years
    #[serde(default = "default_oldest_year")]
    pub oldest_year: i32,

    /// First year queried (defaults to the current year)
    #[serde(default)]
    pub newest_year: Option<i32>,

    #[serde(default)]
    pub webdriver: WebDriverConfig,

    /// Selector that must become visible before results are harvested
    #[serde(default = "default_wait_selector")]
    pub wait_selector: String,

    /// Selector for the result anchors
    #[serde(default = "default_link_selector")]
    pub link_selector: String,

    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// Regex patterns archive links must match (empty means all)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns that reject archive links
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Skip the remaining years once a year returns only known links
    #[serde(default)]
    pub stop_on_known_year: bool,

    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    #[serde(default = "default_destination_dir")]
    pub destination_dir: PathBuf,

    /// Maximum number of concurrent image transfers
    #[serde(default = "default_download_concurrency")]
    pub download_concurrency: usize,

    /// Leave files that already exist in the destination untouched
    #[serde(default = "default_true")]
    pub skip_existing: bool,

    #[serde(default)]
    pub download_scope: DownloadScope,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub image_pattern: ImagePattern,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://www.smashingmagazine.com".to_string()
}

fn default_search_url_template() -> String {
    "https://www.smashingmagazine.com/search/?q=wallpaper%20{year}".to_string()
}

fn default_oldest_year() -> i32 {
    2009
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_wait_selector() -> String {
    "h2.article--post__title".to_string()
}

fn default_link_selector() -> String {
    ".article--post__title a".to_string()
}

fn default_wait_timeout_ms() -> u64 {
    4000
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("links.txt")
}

fn default_destination_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_download_concurrency() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_url_template: default_search_url_template(),
            oldest_year: default_oldest_year(),
            newest_year: None,
            webdriver: WebDriverConfig::default(),
            wait_selector: default_wait_selector(),
            link_selector: default_link_selector(),
            wait_timeout_ms: default_wait_timeout_ms(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            stop_on_known_year: false,
            ledger_path: default_ledger_path(),
            destination_dir: default_destination_dir(),
            download_concurrency: default_download_concurrency(),
            skip_existing: true,
            download_scope: DownloadScope::default(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            image_pattern: ImagePattern::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Override the WebDriver URL from `DRIVER_HOST` or `WEBDRIVER_URL`
    pub fn apply_env(&mut self) {
        for var in ["DRIVER_HOST", "WEBDRIVER_URL"] {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    ::log::debug!("WebDriver URL taken from {}", var);
                    self.webdriver.webdriver_url = value;
                    return;
                }
            }
        }
    }

    /// The newest year to query, falling back to the current year
    pub fn newest_year(&self) -> i32 {
        self.newest_year.unwrap_or_else(crate::utils::current_year)
    }

    pub fn wait_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.wait_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config.oldest_year, 2009);
        assert_eq!(config.wait_timeout_ms, 4000);
        assert_eq!(config.webdriver.webdriver_url, "http://localhost:4444");
        assert_eq!(config.webdriver.browser, Browser::Firefox);
        assert!(config.webdriver.headless);
        assert_eq!(config.download_scope, DownloadScope::NewOnly);
        assert!(config.skip_existing);
        assert_eq!(config.ledger_path, PathBuf::from("links.txt"));
    }

    #[test]
    fn test_partial_overrides() {
        let json = r#"{
            "oldest_year": 2015,
            "newest_year": 2020,
            "download_scope": "all",
            "webdriver": { "browser": "chrome", "headless": false },
            "image_pattern": { "extensions": ["png"] }
        }"#;
        let config = PipelineConfig::from_json(json).unwrap();
        assert_eq!(config.oldest_year, 2015);
        assert_eq!(config.newest_year(), 2020);
        assert_eq!(config.download_scope, DownloadScope::All);
        assert_eq!(config.webdriver.browser, Browser::Chrome);
        assert!(!config.webdriver.headless);
        assert_eq!(config.webdriver.webdriver_url, "http://localhost:4444");
        assert_eq!(config.image_pattern.extensions, vec!["png".to_string()]);
        assert_eq!(config.image_pattern.resolutions.len(), 3);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            PipelineConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = PipelineConfig::from_file(dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
