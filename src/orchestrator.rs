//! Two-level download engine.
//!
//! Chapters are started in ascending order, at most `chapter_threads` at a
//! time, each on its own task. Inside a chapter the discovered pages are
//! shuffled and fetched `page_threads` at a time; all of them are awaited
//! before the chapter directory is packed. Page files are named after the
//! page's position in the chapter, so the archive order never depends on
//! which download finished first.

use crate::archive::ArchiveAssembler;
use crate::error::{ComicScraperError, Result};
use crate::models::{
    ChapterNumber, ChapterOutcome, ChapterRef, ChapterReport, DownloadSettings, PageOutcome,
    PageRef, Work,
};
use crate::storage::StorageManager;
use crate::traits::SiteAdapter;
use crate::utils::HttpClient;
use futures::stream::{self, FuturesUnordered, StreamExt};
use indicatif::ProgressBar;
use rand::seq::SliceRandom;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct DownloadOrchestrator {
    adapter: Arc<dyn SiteAdapter>,
    http: HttpClient,
    storage: StorageManager,
    work_name: String,
    settings: DownloadSettings,
    placeholder: Arc<Vec<u8>>,
    progress: ProgressBar,
}

impl DownloadOrchestrator {
    pub fn new(
        work: &Work,
        adapter: Arc<dyn SiteAdapter>,
        http: HttpClient,
        placeholder: Vec<u8>,
    ) -> Self {
        Self {
            adapter,
            http,
            storage: StorageManager::new(&work.directory),
            work_name: work.name.clone(),
            settings: work.settings,
            placeholder: Arc::new(placeholder),
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Downloads every chapter and reports one outcome per chapter, in
    /// completion order. A failing chapter never stops the others.
    pub async fn run(&self, chapters: Vec<(ChapterNumber, ChapterRef)>) -> Vec<ChapterOutcome> {
        let slots = Arc::new(Semaphore::new(self.settings.chapter_threads.max(1)));
        let mut running = FuturesUnordered::new();

        for (number, chapter) in chapters {
            let Ok(permit) = slots.clone().acquire_owned().await else {
                error!("[ORCHESTRATOR] Chapter pool closed, chapter {} not started", number);
                break;
            };
            let this = self.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                this.run_chapter(chapter).await
            });
            running.push(async move { (number, handle.await) });
        }

        let mut outcomes = Vec::new();
        while let Some((number, joined)) = running.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("[ORCHESTRATOR] Chapter {} failed: {}", number, e);
                    self.progress.inc(1);
                    Err(ComicScraperError::from(e))
                }
            };
            outcomes.push(ChapterOutcome { number, result });
        }
        outcomes
    }

    async fn run_chapter(&self, chapter: ChapterRef) -> Result<ChapterReport> {
        let result = self.download_chapter(&chapter).await;
        match &result {
            Ok(report) => info!(
                "[ORCHESTRATOR] Downloaded: chapter {} ({} pages, {} missing) -> {:?}",
                chapter.number, report.pages, report.placeholders, report.artifact
            ),
            Err(e) => error!("[ORCHESTRATOR] Chapter {} failed: {}", chapter.number, e),
        }
        self.progress.inc(1);
        result
    }

    async fn download_chapter(&self, chapter: &ChapterRef) -> Result<ChapterReport> {
        let label = self.adapter.kind().label();
        debug!("[{}] Discovering pages of chapter {}: {}", label, chapter.number, chapter.url);

        let mut pages = self
            .adapter
            .discover_pages(&self.http, chapter, self.settings.retry)
            .await
            .ok_or_else(|| {
                ComicScraperError::page_discovery_exhausted(chapter.number.to_string())
            })?;
        let total = pages.len();
        info!("[{}] Chapter {} has {} pages", label, chapter.number, total);

        let dir = self.storage.create_chapter_dir(chapter).await?;

        pages.shuffle(&mut rand::thread_rng());
        let outcomes: Vec<Result<PageOutcome>> = stream::iter(pages)
            .map(|page| self.download_page(chapter, &dir, page))
            .buffer_unordered(self.settings.page_threads.max(1))
            .collect()
            .await;
        let outcomes = outcomes.into_iter().collect::<Result<Vec<_>>>()?;
        let placeholders = outcomes
            .iter()
            .filter(|o| matches!(o, PageOutcome::Placeholder(_)))
            .count();

        let artifact = self
            .storage
            .artifact_path(&self.work_name, chapter, self.settings.format);
        let format = self.settings.format;
        let (source, target) = (dir.clone(), artifact.clone());
        tokio::task::spawn_blocking(move || ArchiveAssembler::assemble(&source, &target, format))
            .await??;

        Ok(ChapterReport {
            artifact,
            pages: total,
            placeholders,
        })
    }

    async fn download_page(
        &self,
        chapter: &ChapterRef,
        dir: &Path,
        page: PageRef,
    ) -> Result<PageOutcome> {
        let dest = StorageManager::page_path(dir, &page);
        let downloaded = self
            .adapter
            .resolve_and_download_page(&self.http, &page, &dest, self.settings.retry)
            .await;

        if downloaded {
            debug!("Chapter {} page {} saved to {:?}", chapter.number, page.ordinal, dest);
            return Ok(PageOutcome::Downloaded(page.ordinal));
        }

        warn!(
            "Failed download: chapter {}, page {}; using placeholder",
            chapter.number, page.ordinal
        );
        tokio::fs::write(&dest, self.placeholder.as_slice()).await?;
        Ok(PageOutcome::Placeholder(page.ordinal))
    }
}
