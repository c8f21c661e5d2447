//! Static configuration loaded once at process start.
//!
//! Operators edit `harvester.toml` (credentials, cookies, date window) before
//! running either binary. The resulting [`AppConfig`] is immutable and handed
//! to each component's constructor.

use crate::error::ConfigError;
use crate::types::{DateRange, FeedFilters};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "harvester.toml";
pub const CONFIG_PATH_ENV: &str = "HARVESTER_CONFIG";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://opportunities.db";
pub const DEFAULT_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_SORT: &str = "is_new_opportunity,post.createdutc,desc";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_POLITE_DELAY_SECS: u64 = 1;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
pub const DEFAULT_REPORT_PATH: &str = "full_analysis_results.txt";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub feed: FeedConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub endpoint: String,
    pub origin: String,
    pub referer: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_polite_delay_secs")]
    pub polite_delay_secs: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub subreddits: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Session cookies copied from a browser; they expire out-of-band.
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
}

impl FeedConfig {
    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn filters(&self) -> FeedFilters {
        FeedFilters {
            subreddits: self.subreddits.clone(),
            categories: self.categories.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn polite_delay(&self) -> Duration {
        Duration::from_secs(self.polite_delay_secs)
    }

    /// Cookie map rendered as a single `Cookie` header value.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        Some(pairs.join("; "))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_top_communities")]
    pub top_communities: usize,
    #[serde(default = "default_top_keywords")]
    pub top_keywords: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_path: default_report_path(),
            top_communities: default_top_communities(),
            top_keywords: default_top_keywords(),
        }
    }
}

impl AppConfig {
    /// Loads from `$HARVESTER_CONFIG`, or `harvester.toml` in the working directory.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("feed.endpoint", &self.feed.endpoint),
            ("feed.origin", &self.feed.origin),
            ("feed.referer", &self.feed.referer),
        ] {
            url::Url::parse(value).map_err(|_| ConfigError::InvalidValue {
                field: field.to_string(),
                value: value.clone(),
            })?;
        }

        if self.feed.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "feed.page_size".to_string(),
                value: "0".to_string(),
            });
        }

        if self.feed.start_date > self.feed.end_date {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "start_date {} is after end_date {}",
                    self.feed.start_date, self.feed.end_date
                ),
            });
        }

        if self.report.top_communities == 0 || self.report.top_keywords == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "report limits must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_accept_language() -> String {
    DEFAULT_ACCEPT_LANGUAGE.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_sort() -> String {
    DEFAULT_SORT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_polite_delay_secs() -> u64 {
    DEFAULT_POLITE_DELAY_SECS
}

fn default_report_path() -> PathBuf {
    PathBuf::from(DEFAULT_REPORT_PATH)
}

fn default_top_communities() -> usize {
    30
}

fn default_top_keywords() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[feed]
endpoint = "https://neven.app/api/opportunities"
origin = "https://neven.app"
referer = "https://neven.app/feed"
start_date = "2025-08-04"
end_date = "2026-01-31"
"#;

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
        assert_eq!(config.feed.page_size, 1000);
        assert_eq!(config.feed.sort, DEFAULT_SORT);
        assert_eq!(config.feed.timeout(), Duration::from_secs(10));
        assert_eq!(config.feed.polite_delay(), Duration::from_secs(1));
        assert!(config.feed.subreddits.is_empty());
        assert!(config.feed.cookie_header().is_none());
        assert_eq!(config.report.top_communities, 30);
        assert_eq!(config.report.top_keywords, 50);
        assert_eq!(
            config.report.output_path,
            PathBuf::from("full_analysis_results.txt")
        );
    }

    #[test]
    fn test_date_window_and_filters() {
        let toml = format!(
            "{}subreddits = [\"rust\"]\ncategories = [\"tools\", \"saas\"]\n",
            MINIMAL
        );
        let config = AppConfig::from_toml_str(&toml).unwrap();
        let range = config.feed.date_range();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2025, 8, 4).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        let filters = config.feed.filters();
        assert_eq!(filters.subreddits, vec!["rust"]);
        assert_eq!(filters.categories, vec!["tools", "saas"]);
    }

    #[test]
    fn test_cookie_header() {
        let toml = format!(
            "{}\n[feed.cookies]\nJSESSIONID = \"abc\"\n_ga = \"GA1.1\"\n",
            MINIMAL
        );
        let config = AppConfig::from_toml_str(&toml).unwrap();
        assert_eq!(
            config.feed.cookie_header().as_deref(),
            Some("JSESSIONID=abc; _ga=GA1.1")
        );
    }

    #[test]
    fn test_inverted_window_rejected() {
        let toml = MINIMAL.replace("2025-08-04", "2026-03-01");
        let result = AppConfig::from_toml_str(&toml);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let toml = MINIMAL.replace("https://neven.app/api/opportunities", "not a url");
        match AppConfig::from_toml_str(&toml) {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "feed.endpoint"),
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let toml = format!("{}page_size = 0\n", MINIMAL);
        assert!(matches!(
            AppConfig::from_toml_str(&toml),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_malformed_toml() {
        let result = AppConfig::from_toml_str("[feed\nendpoint = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join(format!(
            "missing_harvester_{}.toml",
            uuid::Uuid::new_v4()
        ));
        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let path =
            std::env::temp_dir().join(format!("test_harvester_{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, MINIMAL).unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.feed.origin, "https://neven.app");
        std::fs::remove_file(&path).ok();
    }
}
