use crate::config::DownloadConfig;
use crate::error::{ComicScraperError, Result};
use crate::registry::SiteKind;
use crate::retry::RetryPolicy;
use crate::storage::sanitize_filename;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

/// Output artifact produced for every chapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Zip based comic book archive.
    #[default]
    #[serde(alias = "archive")]
    #[value(alias = "archive")]
    Cbz,
    /// One image per page, in page order.
    #[serde(alias = "document")]
    #[value(alias = "document")]
    Pdf,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Cbz => "cbz",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A chapter number, stored in thousandths so that `10.5` and `10.50`
/// compare and hash identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChapterNumber(i64);

impl ChapterNumber {
    const SCALE: i64 = 1000;

    pub fn whole(n: u32) -> Self {
        Self(i64::from(n) * Self::SCALE)
    }
}

impl FromStr for ChapterNumber {
    type Err = ComicScraperError;

    fn from_str(s: &str) -> Result<Self> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| ComicScraperError::scraping(format!("invalid chapter number '{}'", s)))?;
        if !value.is_finite() || value < 0.0 {
            return Err(ComicScraperError::scraping(format!(
                "invalid chapter number '{}'",
                s
            )));
        }
        Ok(Self((value * Self::SCALE as f64).round() as i64))
    }
}

impl fmt::Display for ChapterNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::SCALE;
        let frac = self.0 % Self::SCALE;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            let digits = format!("{:03}", frac);
            write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
        }
    }
}

/// One title being downloaded.
#[derive(Debug, Clone)]
pub struct Work {
    pub url: String,
    pub name: String,
    pub site: SiteKind,
    /// `{location}/{name}`; chapters and artifacts are written here.
    pub directory: PathBuf,
    pub settings: DownloadSettings,
}

/// Per-work knobs copied by value into every chapter and page task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadSettings {
    pub chapter_threads: usize,
    pub page_threads: usize,
    pub retry: RetryPolicy,
    pub format: OutputFormat,
}

impl DownloadSettings {
    pub fn from_config(config: &DownloadConfig) -> Self {
        Self {
            chapter_threads: config.chapter_threads.max(1),
            page_threads: config.page_threads.max(1),
            retry: config.retry_policy(),
            format: config.format,
        }
    }
}

impl Work {
    pub fn new(url: &str, config: &DownloadConfig) -> Result<Self> {
        let site = SiteKind::from_url(url)
            .ok_or_else(|| ComicScraperError::unsupported_source(url))?;
        Self::with_site(url, site, config)
    }

    /// Like [`Work::new`] for a URL whose host does not identify the site,
    /// such as a mirror.
    pub fn with_site(url: &str, site: SiteKind, config: &DownloadConfig) -> Result<Self> {
        let name = work_name(url)?;
        let directory = config.location.join(sanitize_filename(&name));

        Ok(Self {
            url: url.to_string(),
            name,
            site,
            directory,
            settings: DownloadSettings::from_config(config),
        })
    }
}

/// Last non-empty path segment of the work URL.
pub fn work_name(url: &str) -> Result<String> {
    let parsed = Url::parse(url)?;
    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.to_string())
        .ok_or_else(|| ComicScraperError::scraping(format!("no work name in url '{}'", url)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRef {
    pub number: ChapterNumber,
    /// `None` for sites without volumes.
    pub volume: Option<u32>,
    pub url: String,
}

impl ChapterRef {
    pub fn new(number: ChapterNumber, url: impl Into<String>) -> Self {
        Self {
            number,
            volume: None,
            url: url.into(),
        }
    }

    pub fn with_volume(mut self, volume: u32) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Name of the scratch directory pages are downloaded into.
    pub fn scratch_dir_name(&self) -> String {
        format!("chapter-{}", self.number)
    }

    /// `{work}-{number}` with ` (v{volume})` appended when the site has volumes.
    pub fn artifact_stem(&self, work_name: &str) -> String {
        match self.volume {
            Some(volume) => format!("{}-{} (v{})", work_name, self.number, volume),
            None => format!("{}-{}", work_name, self.number),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    /// Final image URL for direct sites, viewer page URL otherwise.
    pub url: String,
    /// 1-based position in the chapter.
    pub ordinal: u32,
}

impl PageRef {
    pub fn new(url: impl Into<String>, ordinal: u32) -> Self {
        Self {
            url: url.into(),
            ordinal,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{:03}.jpg", self.ordinal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Downloaded(u32),
    Placeholder(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterReport {
    pub artifact: PathBuf,
    pub pages: usize,
    pub placeholders: usize,
}

#[derive(Debug)]
pub struct ChapterOutcome {
    pub number: ChapterNumber,
    pub result: Result<ChapterReport>,
}

impl ChapterOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
