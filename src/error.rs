use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComicScraperError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("ZIP compression error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Unable to obtain pages in chapter {0}")]
    PageDiscoveryExhausted(String),

    #[error("Invalid chapter range: {0}")]
    InvalidChapterRange(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Assembly error: {0}")]
    Assembly(String),

    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Site not supported: {0}")]
    UnsupportedSource(String),
}

impl ComicScraperError {
    pub fn scraping(msg: impl Into<String>) -> Self {
        Self::Scraping(msg.into())
    }

    pub fn page_discovery_exhausted(chapter: impl Into<String>) -> Self {
        Self::PageDiscoveryExhausted(chapter.into())
    }

    pub fn invalid_chapter_range(range: impl Into<String>) -> Self {
        Self::InvalidChapterRange(range.into())
    }

    pub fn invalid_setting(msg: impl Into<String>) -> Self {
        Self::InvalidSetting(msg.into())
    }

    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::Assembly(msg.into())
    }

    pub fn unsupported_source(url: impl Into<String>) -> Self {
        Self::UnsupportedSource(url.into())
    }
}

pub type Result<T> = std::result::Result<T, ComicScraperError>;
