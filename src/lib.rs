//! Downloads comics and manga from reader sites, one cbz or pdf per chapter.

pub mod adapters;
pub mod archive;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod placeholder;
pub mod registry;
pub mod retry;
pub mod storage;
pub mod traits;
pub mod utils;

pub use catalog::{ChapterCatalog, ChapterRange};
pub use config::Config;
pub use error::{ComicScraperError, Result};
pub use models::{ChapterNumber, OutputFormat, Work};
pub use pipeline::{download_work, list_chapters, WorkSummary};
pub use registry::SiteKind;
