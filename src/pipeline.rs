use crate::catalog::{ChapterCatalog, ChapterRange};
use crate::config::Config;
use crate::error::Result;
use crate::models::{ChapterOutcome, Work};
use crate::orchestrator::DownloadOrchestrator;
use crate::placeholder;
use crate::storage::StorageManager;
use crate::utils::HttpClient;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// What happened to one work.
#[derive(Debug)]
pub struct WorkSummary {
    pub work: String,
    /// Chapters found on the landing page, before the range was applied.
    pub discovered: usize,
    pub outcomes: Vec<ChapterOutcome>,
}

impl WorkSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Lists the chapters of a work without downloading anything.
pub async fn list_chapters(work: &Work, config: &Config) -> Result<ChapterCatalog> {
    let http = HttpClient::negotiate(&work.url, &config.http).await?;
    work.site.adapter().discover_chapters(&http, work).await
}

/// Discovers the chapters of `work`, keeps those inside `range` and
/// downloads them. Chapter failures are reported in the summary; only
/// failures that prevent discovery itself are returned as errors.
pub async fn download_work(
    work: &Work,
    config: &Config,
    range: Option<&ChapterRange>,
) -> Result<WorkSummary> {
    let adapter = work.site.adapter();
    let http = HttpClient::negotiate(&work.url, &config.http).await?;

    let catalog = adapter.discover_chapters(&http, work).await?;
    let selected = catalog.filter(range);
    let numbers: Vec<String> = selected.iter().map(|(n, _)| n.to_string()).collect();
    info!(
        "[{}] Downloading the below chapters: [{}]",
        work.site.label(),
        numbers.join(", ")
    );

    let mut summary = WorkSummary {
        work: work.name.clone(),
        discovered: catalog.len(),
        outcomes: Vec::new(),
    };
    if selected.is_empty() {
        return Ok(summary);
    }

    StorageManager::new(&work.directory).ensure_work_dir().await?;
    let placeholder = placeholder::load(config.download.placeholder.as_deref())?;

    let progress = ProgressBar::new(selected.len() as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chapters",
    ) {
        progress.set_style(style.progress_chars("#>-"));
    }

    let orchestrator =
        DownloadOrchestrator::new(work, adapter, http, placeholder).with_progress(progress.clone());
    summary.outcomes = orchestrator.run(selected).await;
    progress.finish_and_clear();

    info!(
        "[{}] {}: {} chapters downloaded, {} failed",
        work.site.label(),
        work.name,
        summary.succeeded(),
        summary.failed()
    );
    Ok(summary)
}
