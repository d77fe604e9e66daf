use crate::error::{ComicScraperError, Result};
use crate::models::OutputFormat;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest accepted mean wait between retries, in seconds.
pub const MAX_WAIT_SECS: f64 = 3600.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub download: DownloadConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Root directory; each work gets its own subdirectory below it.
    pub location: PathBuf,
    pub chapter_threads: usize,
    pub page_threads: usize,
    /// Mean backoff between retries, in seconds.
    pub wait_time: f64,
    pub max_retries: u32,
    pub format: OutputFormat,
    /// Image written in place of pages that could not be downloaded.
    pub placeholder: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// When false, certificates are never verified.
    pub verify_https: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.download.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

impl DownloadConfig {
    /// Rejects settings that cannot drive a download.
    pub fn validate(&self) -> Result<()> {
        if !self.wait_time.is_finite() || !(0.0..=MAX_WAIT_SECS).contains(&self.wait_time) {
            return Err(ComicScraperError::invalid_setting(format!(
                "wait_time must be between 0 and {} seconds, got {}",
                MAX_WAIT_SECS, self.wait_time
            )));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let wait = Duration::try_from_secs_f64(self.wait_time.clamp(0.0, MAX_WAIT_SECS))
            .unwrap_or_default();
        RetryPolicy::new(self.max_retries, wait)
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            location: PathBuf::from("."),
            chapter_threads: 5,
            page_threads: 10,
            wait_time: 10.0,
            max_retries: 10,
            format: OutputFormat::Cbz,
            placeholder: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
                "(KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
            )
            .to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            verify_https: true,
        }
    }
}
