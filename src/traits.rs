use crate::catalog::ChapterCatalog;
use crate::error::Result;
use crate::models::{ChapterRef, PageRef, Work};
use crate::registry::SiteKind;
use crate::retry::RetryPolicy;
use crate::utils::HttpClient;
use std::path::Path;
use tracing::debug;

/// Chapter and page discovery for one family of sites.
///
/// Implementors only describe how to read a site's documents; fetching,
/// retrying and writing images is shared by the provided methods.
#[async_trait::async_trait]
pub trait SiteAdapter: Send + Sync {
    fn kind(&self) -> SiteKind;

    /// Harvests chapters from the work's landing page. Links that do not
    /// carry a parseable chapter number are skipped.
    fn parse_chapters(&self, work: &Work, html: &str) -> ChapterCatalog;

    /// Document that lists a chapter's pages.
    fn pages_url(&self, chapter: &ChapterRef) -> String {
        chapter.url.clone()
    }

    /// Pages in reading order, or `None` while the page list is missing.
    fn parse_pages(&self, chapter: &ChapterRef, html: &str) -> Option<Vec<PageRef>>;

    /// Image URL found on a page's viewer document.
    fn parse_image_url(&self, page: &PageRef, html: &str) -> Option<String>;

    /// Whether page URLs point at a viewer document rather than the image.
    fn has_viewer(&self) -> bool {
        true
    }

    async fn discover_chapters(&self, http: &HttpClient, work: &Work) -> Result<ChapterCatalog> {
        let html = http.get_text(&work.url).await?;
        debug!("[{}] landing page length: {}", self.kind().label(), html.len());
        Ok(self.parse_chapters(work, &html))
    }

    async fn discover_pages(
        &self,
        http: &HttpClient,
        chapter: &ChapterRef,
        policy: RetryPolicy,
    ) -> Option<Vec<PageRef>> {
        let url = self.pages_url(chapter);
        let url = url.as_str();
        policy
            .fetch_until(&format!("pages of chapter {}", chapter.number), move || {
                probe_pages(self, http, url, chapter)
            })
            .await
    }

    /// Fetches the page image (through its viewer when needed) into `dest`.
    async fn resolve_and_download_page(
        &self,
        http: &HttpClient,
        page: &PageRef,
        dest: &Path,
        policy: RetryPolicy,
    ) -> bool {
        policy
            .fetch_until(&format!("page {}", page.ordinal), move || {
                download_once(self, http, page, dest)
            })
            .await
            .is_some()
    }
}

async fn probe_pages<A: SiteAdapter + ?Sized>(
    adapter: &A,
    http: &HttpClient,
    url: &str,
    chapter: &ChapterRef,
) -> Result<Option<Vec<PageRef>>> {
    let html = http.get_text(url).await?;
    Ok(adapter.parse_pages(chapter, &html))
}

async fn download_once<A: SiteAdapter + ?Sized>(
    adapter: &A,
    http: &HttpClient,
    page: &PageRef,
    dest: &Path,
) -> Result<Option<()>> {
    let image_url = if adapter.has_viewer() {
        let html = http.get_text(&page.url).await?;
        match adapter.parse_image_url(page, &html) {
            Some(url) => url,
            None => return Ok(None),
        }
    } else {
        page.url.clone()
    };

    let bytes = http.get_bytes(&image_url).await?;
    tokio::fs::write(dest, bytes).await?;
    Ok(Some(()))
}
